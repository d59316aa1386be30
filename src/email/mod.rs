use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    pub async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<(), String> {
        let html = render_password_reset(reset_url);
        self.send(to_email, "Password reset", &html).await
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

fn render_password_reset(reset_url: &str) -> String {
    format!(
        "<html><body>\
         <p>A password reset was requested for your account.</p>\
         <p><a href=\"{reset_url}\">Reset your password</a></p>\
         <p>The link expires in one hour. If you did not request this, you can ignore this email.</p>\
         </body></html>"
    )
}
