//! `otpauth://` and `otpauth-migration://` URL parsing
//!
//! Parsing is pure: it turns text into an [`IngestUrl`] without touching
//! any store. [`crate::Store::add_url`] applies the result.

use percent_encoding::percent_decode_str;
use url::Url;

use super::migration::{self, Payload, MIGRATION_SCHEME};
use crate::entry::Entry;
use crate::error::{Result, VaultError};

/// Scheme of single-credential URLs
pub const OTPAUTH_SCHEME: &str = "otpauth";

/// A parsed ingestion URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestUrl {
    /// `otpauth://totp/...`: exactly one credential
    Single(Entry),
    /// `otpauth-migration://...`: a decoded batch export
    Migration(Payload),
}

impl IngestUrl {
    /// Entries to append, in order
    pub fn into_entries(self) -> Vec<Entry> {
        match self {
            IngestUrl::Single(entry) => vec![entry],
            IngestUrl::Migration(payload) => entries_from_payload(payload),
        }
    }
}

/// Parse text as an ingestion URL and dispatch on its scheme
pub fn parse_url(input: &str) -> Result<IngestUrl> {
    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(VaultError::InvalidSchemeError("URL has no scheme".to_string()))
        }
        Err(e) => return Err(VaultError::InvalidUrl(e.to_string())),
    };

    match url.scheme() {
        OTPAUTH_SCHEME => parse_otpauth(&url).map(IngestUrl::Single),
        MIGRATION_SCHEME => migration::decode_url(input).map(IngestUrl::Migration),
        other => Err(VaultError::InvalidSchemeError(other.to_string())),
    }
}

/// Parse `otpauth://totp/[issuer:]name?secret=...[&issuer=...]`
fn parse_otpauth(url: &Url) -> Result<Entry> {
    let protocol = url.host_str().unwrap_or_default();
    if protocol != "totp" {
        return Err(VaultError::UnsupportedProtocolError(protocol.to_string()));
    }

    let path = url.path().trim_start_matches('/');
    let label = percent_decode_str(path)
        .decode_utf8()
        .map_err(|e| VaultError::InvalidUrl(format!("label is not UTF-8: {}", e)))?;

    let query_value = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    };

    let (issuer, name) = match label.split_once(':') {
        Some((issuer, name)) => (issuer.to_string(), name.to_string()),
        None => (query_value("issuer"), label.into_owned()),
    };

    let secret = query_value("secret");
    if secret.is_empty() {
        return Err(VaultError::MissingSecretError);
    }

    Ok(Entry::new(issuer, name, secret))
}

/// Turn migration records into entries
///
/// A colon in a record's name splits it into issuer and name, overriding
/// the record's own issuer, the same way single URLs are read.
pub fn entries_from_payload(payload: Payload) -> Vec<Entry> {
    payload
        .otp_parameters
        .into_iter()
        .map(|params| {
            let secret = params.secret_string();
            match params.name.split_once(':') {
                Some((issuer, name)) => Entry::new(issuer, name, secret),
                None => Entry::new(params.issuer.clone(), params.name.clone(), secret),
            }
        })
        .collect()
}
