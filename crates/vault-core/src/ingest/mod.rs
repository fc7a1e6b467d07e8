//! Credential ingestion from authenticator URLs

pub mod migration;
mod otpauth;

pub use otpauth::{entries_from_payload, parse_url, IngestUrl, OTPAUTH_SCHEME};
pub use migration::{Algorithm, DigitCount, OtpParameters, OtpType, Payload, MIGRATION_SCHEME};
