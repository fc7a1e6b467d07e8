//! Store file persistence
//!
//! - Format detection and encoding (plaintext, legacy CBC, sealed GCM)
//! - Byte-exact reads and atomic writes

mod file;
mod format;

pub use file::{read_store_file, write_atomic};
pub use format::{decode, detect, encode, ContentKind, StoreFormat, EMPTY_LIST};
