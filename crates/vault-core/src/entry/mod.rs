//! TOTP entry model

mod types;

pub use types::Entry;
