//! The credential store: an ordered entry list bound to one encrypted file

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::crypto::{KeyDerivationParams, Password};
use crate::entry::Entry;
use crate::error::{Result, VaultError};
use crate::ingest::parse_url;
use crate::storage::{self, ContentKind, StoreFormat};

/// Password-protected, ordered collection of TOTP entries
///
/// The entry list lives in memory. [`Store::load`] replaces it from disk
/// and [`Store::save`] writes it back; nothing else touches the file, so
/// the file always reflects the last successful save.
///
/// There is no internal locking. Hosts sharing a store between threads
/// wrap it in a mutex.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    password: Password,
    format: StoreFormat,
    kdf_params: KeyDerivationParams,
    entries: Vec<Entry>,
}

impl Store {
    /// Create an empty store bound to `path`; nothing is read until [`Store::load`]
    pub fn new(path: impl Into<PathBuf>, password: impl Into<Password>) -> Self {
        Self {
            path: path.into(),
            password: password.into(),
            format: StoreFormat::default(),
            kdf_params: KeyDerivationParams::default(),
            entries: Vec::new(),
        }
    }

    /// Save in the given format
    pub fn with_format(mut self, format: StoreFormat) -> Self {
        self.format = format;
        self
    }

    /// Argon2 cost used when saving in the sealed format
    pub fn with_kdf_params(mut self, params: KeyDerivationParams) -> Self {
        self.kdf_params = params;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    pub fn set_format(&mut self, format: StoreFormat) {
        self.format = format;
    }

    /// Replace the password used by subsequent loads and saves
    pub fn set_password(&mut self, password: impl Into<Password>) {
        self.password = password.into();
    }

    /// Entries in display order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the in-memory entries with the file's contents
    ///
    /// A missing file is an empty store. On error the entry list is left
    /// empty. Loading a sealed file switches later saves to the sealed
    /// format.
    pub fn load(&mut self) -> Result<()> {
        self.entries.clear();

        let contents = storage::read_store_file(&self.path)?;
        let kind = storage::detect(&contents);
        debug!("Store file {:?} detected as {:?}", self.path, kind);

        let json = storage::decode(&contents, self.password.expose())?;
        let entries: Vec<Entry> =
            serde_json::from_str(&json).map_err(VaultError::DeserializationError)?;

        if kind == ContentKind::Sealed {
            self.format = StoreFormat::Sealed;
        }
        self.entries = entries;

        info!("Loaded {} entries", self.entries.len());
        Ok(())
    }

    /// Encrypt the entries and replace the file with them
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries).map_err(VaultError::SerializationError)?;
        let contents = storage::encode(
            &json,
            self.password.expose(),
            self.format,
            &self.kdf_params,
        )?;
        storage::write_atomic(&self.path, &contents)?;

        info!("Saved {} entries ({:?} format)", self.entries.len(), self.format);
        Ok(())
    }

    /// Parse an `otpauth://` or `otpauth-migration://` URL and append its entries
    ///
    /// Returns how many entries were appended. Nothing is appended on
    /// error, and nothing is written to disk either way.
    pub fn add_url(&mut self, url: &str) -> Result<usize> {
        let new_entries = parse_url(url)?.into_entries();
        let count = new_entries.len();
        self.entries.extend(new_entries);

        debug!("Appended {} entries from URL", count);
        Ok(count)
    }

    /// Append one entry
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Remove and return the entry at `index`
    pub fn remove(&mut self, index: usize) -> Result<Entry> {
        self.check_index(index)?;
        Ok(self.entries.remove(index))
    }

    /// Change the issuer and name of the entry at `index`; the secret is kept
    pub fn rename(
        &mut self,
        index: usize,
        issuer: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<()> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(VaultError::EntryNotFound(index))?;
        entry.issuer = issuer.into();
        entry.name = name.into();
        Ok(())
    }

    /// Exchange the entries at `a` and `b`
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        self.entries.swap(a, b);
        Ok(())
    }

    /// Move the entry at `index` one place towards the front (no-op at the front)
    pub fn move_up(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if index > 0 {
            self.entries.swap(index, index - 1);
        }
        Ok(())
    }

    /// Move the entry at `index` one place towards the back (no-op at the back)
    pub fn move_down(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if index + 1 < self.entries.len() {
            self.entries.swap(index, index + 1);
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(VaultError::EntryNotFound(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::fast_params;
    use std::fs;
    use tempfile::TempDir;

    const EXAMPLE_URL: &str = "otpauth://totp/Example:alice@google.com?secret=JBSWY3DPEHPK3PXP";
    const EXAMPLE_MIGRATION_URL: &str =
        "otpauth-migration://offline?data=CjEKCkhlbGxvId6tvu8SGEV4YW1wbGU6YWxpY2VAZ29vZ2xlLmNvbRoHRXhhbXBsZTAC";

    fn example_entry() -> Entry {
        Entry::new("Example", "alice@google.com", "JBSWY3DPEHPK3PXP")
    }

    fn sample_entries() -> Vec<Entry> {
        vec![
            example_entry(),
            Entry::new("", "bob", "GEZDGNBVGY3TQOJQ"),
            Entry::new("GitHub", "carol", "MFRGGZDFMZTWQ2LK"),
            // duplicates are allowed
            example_entry(),
        ]
    }

    fn test_store(temp_dir: &TempDir) -> Store {
        Store::new(temp_dir.path().join("totp_tokens"), "password")
    }

    fn store_with(temp_dir: &TempDir, entries: Vec<Entry>) -> Store {
        let mut store = test_store(temp_dir);
        for entry in entries {
            store.push(entry);
        }
        store
    }

    #[test]
    fn test_add_totp_url() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        assert_eq!(store.add_url(EXAMPLE_URL).unwrap(), 1);
        assert_eq!(store.entries(), &[example_entry()]);
    }

    #[test]
    fn test_add_migration_url() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        assert_eq!(store.add_url(EXAMPLE_MIGRATION_URL).unwrap(), 1);
        assert_eq!(store.entries(), &[example_entry()]);
    }

    #[test]
    fn test_add_url_does_not_touch_disk() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.add_url(EXAMPLE_URL).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_failed_add_url_appends_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, vec![example_entry()]);

        let result = store.add_url("otpauth://totp/Example:alice@google.com");
        assert!(matches!(result, Err(VaultError::MissingSecretError)));

        let result = store.add_url("https://example.com");
        assert!(matches!(result, Err(VaultError::InvalidSchemeError(_))));

        let result = store.add_url("otpauth-migration://offline?data=CjEKCkhlbGxv");
        assert!(matches!(result, Err(VaultError::MigrationDecodeError(_))));

        assert_eq!(store.entries(), &[example_entry()]);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with(&temp_dir, sample_entries());
        store.save().unwrap();

        let mut loaded = test_store(&temp_dir);
        loaded.load().unwrap();
        assert_eq!(loaded.entries(), sample_entries().as_slice());
    }

    #[test]
    fn test_save_load_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.save().unwrap();

        // saved empty stores are encrypted, not the bare `[]` literal
        assert_ne!(fs::read(store.path()).unwrap(), b"[]");

        let mut loaded = test_store(&temp_dir);
        loaded.load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_sealed_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, sample_entries())
            .with_format(StoreFormat::Sealed)
            .with_kdf_params(fast_params());
        store.save().unwrap();
        assert_eq!(
            storage::detect(&fs::read(store.path()).unwrap()),
            ContentKind::Sealed
        );

        let mut loaded = test_store(&temp_dir);
        assert_eq!(loaded.format(), StoreFormat::Legacy);
        loaded.load().unwrap();
        assert_eq!(loaded.entries(), sample_entries().as_slice());
        assert_eq!(loaded.format(), StoreFormat::Sealed);

        store.set_password("other");
        assert!(matches!(store.load(), Err(VaultError::DecryptionError(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_plaintext_empty_list_loads_without_password() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("totp_tokens");
        fs::write(&path, b"[]").unwrap();

        let mut store = Store::new(&path, "");
        store.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_plaintext_legacy_store_loads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("totp_tokens");
        fs::write(
            &path,
            br#"[{"issuer":"Example","name":"alice@google.com","secret":"JBSWY3DPEHPK3PXP"},{"name":"bob","secret":"GEZDGNBVGY3TQOJQ","issuer":""}]"#,
        )
        .unwrap();

        let mut store = Store::new(&path, "password");
        store.load().unwrap();
        assert_eq!(
            store.entries(),
            &[example_entry(), Entry::new("", "bob", "GEZDGNBVGY3TQOJQ")]
        );

        // the next save encrypts it
        store.save().unwrap();
        assert_eq!(
            storage::detect(&fs::read(&path).unwrap()),
            ContentKind::Legacy
        );
    }

    #[test]
    fn test_wrong_password_never_reproduces_entries() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with(&temp_dir, sample_entries());
        store.save().unwrap();

        let mut wrong = Store::new(store.path(), "not the password");
        match wrong.load() {
            Ok(()) => assert_ne!(wrong.entries(), sample_entries().as_slice()),
            Err(_) => assert!(wrong.is_empty()),
        }
    }

    #[test]
    fn test_corrupt_file_leaves_entries_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, sample_entries());
        fs::write(store.path(), b"garbage").unwrap();

        let result = store.load();
        assert!(matches!(result, Err(VaultError::MalformedCiphertextError(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        fs::write(store.path(), b"").unwrap();

        assert!(matches!(
            store.load(),
            Err(VaultError::MalformedCiphertextError(_))
        ));
    }

    #[test]
    fn test_invalid_plaintext_json_is_deserialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        fs::write(store.path(), br#"[{"issuer":1}]"#).unwrap();

        assert!(matches!(
            store.load(),
            Err(VaultError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_save_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("totp_tokens");
        let mut store = Store::new(&path, "password");
        store.add_url(EXAMPLE_URL).unwrap();

        store.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unsaved_changes_do_not_reach_disk() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, vec![example_entry()]);
        store.save().unwrap();

        store.add_url("otpauth://totp/extra?secret=GEZDGNBVGY3TQOJQ").unwrap();
        store.remove(0).unwrap();

        let mut reloaded = test_store(&temp_dir);
        reloaded.load().unwrap();
        assert_eq!(reloaded.entries(), &[example_entry()]);
    }

    #[test]
    fn test_move_up_and_down() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, sample_entries());

        store.move_up(1).unwrap();
        assert_eq!(store.entries()[0].name, "bob");

        store.move_up(0).unwrap();
        assert_eq!(store.entries()[0].name, "bob");

        store.move_down(0).unwrap();
        assert_eq!(store.entries()[1].name, "bob");

        let last = store.len() - 1;
        store.move_down(last).unwrap();
        assert_eq!(store.entries()[last], example_entry());

        assert!(matches!(
            store.move_down(store.len()),
            Err(VaultError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_rename_keeps_secret() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, vec![example_entry()]);

        store.rename(0, "Google", "alice").unwrap();
        assert_eq!(
            store.entries()[0],
            Entry::new("Google", "alice", "JBSWY3DPEHPK3PXP")
        );

        assert!(matches!(
            store.rename(3, "x", "y"),
            Err(VaultError::EntryNotFound(3))
        ));
    }

    #[test]
    fn test_remove_and_swap() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, sample_entries());

        store.swap(0, 2).unwrap();
        assert_eq!(store.entries()[0].issuer, "GitHub");

        let removed = store.remove(0).unwrap();
        assert_eq!(removed.name, "carol");
        assert_eq!(store.len(), 3);

        assert!(matches!(store.remove(3), Err(VaultError::EntryNotFound(3))));
        assert!(matches!(store.swap(0, 9), Err(VaultError::EntryNotFound(9))));
    }
}
