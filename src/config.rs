use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_days: i64,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub frontend_origin: String,
    pub environment: String,
    pub password_min_len: usize,
    pub max_body_size: usize,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let jwt_expires_days: i64 = env_or("JWT_EXPIRES_DAYS", "7")
            .parse()
            .map_err(|e| format!("Invalid JWT_EXPIRES_DAYS: {e}"))?;

        let host: IpAddr = env_or("ESTETICA_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid ESTETICA_HOST: {e}"))?;

        let port: u16 = env_or("ESTETICA_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid ESTETICA_PORT: {e}"))?;

        let base_url = env_or("ESTETICA_BASE_URL", &format!("http://{host}:{port}"));

        let frontend_origin = env_or("ESTETICA_FRONTEND_ORIGIN", "http://localhost:5173");

        let environment = env_or("ESTETICA_ENV", "development");

        let password_min_len: usize = env_or("ESTETICA_PASSWORD_MIN_LEN", "6")
            .parse()
            .map_err(|e| format!("Invalid ESTETICA_PASSWORD_MIN_LEN: {e}"))?;

        let max_body_size: usize = env_or("ESTETICA_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid ESTETICA_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("ESTETICA_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("ESTETICA_SMTP_HOST").ok(),
            std::env::var("ESTETICA_SMTP_PORT").ok(),
            std::env::var("ESTETICA_SMTP_USER").ok(),
            std::env::var("ESTETICA_SMTP_PASS").ok(),
            std::env::var("ESTETICA_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid ESTETICA_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expires_days,
            host,
            port,
            base_url,
            frontend_origin,
            environment,
            password_min_len,
            max_body_size,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
