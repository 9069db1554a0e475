//! Error types for codesync-content

use crate::Language;

/// Result type for codesync-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in codesync-content operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Function `{name}` not found in {language} source")]
    FunctionNotFound { language: Language, name: String },

    #[error("Failed to parse {language} source: {message}")]
    ParseError { language: Language, message: String },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Patch rejected: hunk {hunk} does not match the target near line {line}")]
    PatchRejected { hunk: usize, line: usize },

    #[error("Invalid patch at line {line}: {message}")]
    InvalidPatch { line: usize, message: String },

    #[error(transparent)]
    Fs(#[from] codesync_fs::Error),
}

impl Error {
    pub fn not_found(language: Language, name: impl Into<String>) -> Self {
        Self::FunctionNotFound {
            language,
            name: name.into(),
        }
    }

    pub fn parse(language: Language, message: impl Into<String>) -> Self {
        Self::ParseError {
            language,
            message: message.into(),
        }
    }
}
