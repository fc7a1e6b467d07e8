//! Entry type definitions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

// Characters escaped in the label path segment. `:` and `@` stay literal
// so `Issuer:user@example.com` labels read naturally.
const LABEL_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One stored TOTP credential
///
/// Field order matches the on-disk JSON objects
/// (`{"issuer":..,"name":..,"secret":..}`).
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Service that issued the credential (may be empty)
    pub issuer: String,

    /// Account name
    pub name: String,

    /// Base32-encoded shared secret
    pub secret: String,
}

impl Entry {
    /// Create a new entry
    pub fn new(issuer: impl Into<String>, name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            name: name.into(),
            secret: secret.into(),
        }
    }

    /// Label shown to users: `issuer: name`, or just `name` without an issuer
    pub fn display_name(&self) -> String {
        if self.issuer.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.issuer, self.name)
        }
    }

    /// Build an `otpauth://totp/...` URL that re-imports to this entry
    pub fn to_otpauth_url(&self) -> String {
        let label = if self.issuer.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.issuer, self.name)
        };

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("secret", &self.secret);
        if !self.issuer.is_empty() {
            query.append_pair("issuer", &self.issuer);
        }

        format!(
            "otpauth://totp/{}?{}",
            utf8_percent_encode(&label, LABEL_ENCODE_SET),
            query.finish()
        )
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("issuer", &self.issuer)
            .field("name", &self.name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let entry = Entry::new("Example", "alice@google.com", "JBSWY3DPEHPK3PXP");
        assert_eq!(entry.display_name(), "Example: alice@google.com");

        let entry = Entry::new("", "alice@google.com", "JBSWY3DPEHPK3PXP");
        assert_eq!(entry.display_name(), "alice@google.com");
    }

    #[test]
    fn test_json_shape() {
        let entry = Entry::new("Example", "alice", "JBSWY3DPEHPK3PXP");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"issuer":"Example","name":"alice","secret":"JBSWY3DPEHPK3PXP"}"#
        );
    }

    #[test]
    fn test_json_field_order_irrelevant() {
        let json = r#"{"secret":"S","name":"N","issuer":"I"}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry, Entry::new("I", "N", "S"));
    }

    #[test]
    fn test_otpauth_url() {
        let entry = Entry::new("Example", "alice@google.com", "JBSWY3DPEHPK3PXP");
        assert_eq!(
            entry.to_otpauth_url(),
            "otpauth://totp/Example:alice@google.com?secret=JBSWY3DPEHPK3PXP&issuer=Example"
        );
    }

    #[test]
    fn test_otpauth_url_without_issuer() {
        let entry = Entry::new("", "bob smith", "JBSWY3DPEHPK3PXP");
        assert_eq!(
            entry.to_otpauth_url(),
            "otpauth://totp/bob%20smith?secret=JBSWY3DPEHPK3PXP"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let entry = Entry::new("Example", "alice", "JBSWY3DPEHPK3PXP");
        let debug = format!("{:?}", entry);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("JBSWY3DPEHPK3PXP"));
    }
}
