//! Filesystem primitives for codesync
//!
//! Provides normalized paths, atomic I/O with advisory locking, and the
//! content fingerprints used for drift detection.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{Fingerprint, fingerprint, fingerprint_tree};
pub use error::{Error, Result};
pub use io::FileLock;
pub use path::{NormalizedPath, sanitize_file_name};
