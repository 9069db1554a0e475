//! Error types for codesync-git

use std::path::PathBuf;

/// Result type for codesync-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in codesync-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] codesync_fs::Error),

    #[error("No repository mirror at {path}")]
    RepositoryNotFound { path: PathBuf },

    #[error("Reference '{reference}' not found in {repo}")]
    ReferenceNotFound { repo: String, reference: String },

    #[error("Path '{path}' not found in {repo} at {reference}")]
    PathNotFound {
        repo: String,
        reference: String,
        path: String,
    },

    #[error("'{path}' in {repo} is not a {expected}")]
    WrongEntryKind {
        repo: String,
        path: String,
        expected: &'static str,
    },

    #[error("'{path}' in {repo} is not valid UTF-8 text")]
    NotText { repo: String, path: String },

    #[error("Repository unavailable: {message}")]
    Unavailable { message: String },
}
