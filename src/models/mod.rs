pub mod anamnesis;
pub mod appointment;
pub mod client;
pub mod financial_entry;
pub mod package;
pub mod password_reset_token;
pub mod service;
pub mod tenant;
pub mod user;

pub use anamnesis::AnamnesisRecord;
pub use appointment::{Appointment, AppointmentService, AppointmentStatus};
pub use client::Client;
pub use financial_entry::{FinancialEntry, PaymentMethod, PaymentStatus};
pub use package::{ClientPackage, Package};
pub use password_reset_token::PasswordResetToken;
pub use service::Service;
pub use tenant::Tenant;
pub use user::{Role, User};
