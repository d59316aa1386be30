pub mod scope;

pub mod anamnesis;
pub mod appointments;
pub mod clients;
pub mod financials;
pub mod packages;
pub mod password_reset_tokens;
pub mod services;
pub mod tenants;
pub mod users;
