//! Error types for codesync-core

use codesync_content::Language;

/// Result type for codesync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigurationInvalid,
    RemoteUnavailable,
    LocalIo,
    FunctionNotFound,
    ParseError,
    PatchRejected,
    Conflict,
    StateNotFound,
    Cancelled,
    Other,
}

/// Errors that can occur in codesync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed configuration or tracked item
    #[error("Invalid configuration{}: {message}", item_context(.item))]
    ConfigurationInvalid {
        item: Option<String>,
        message: String,
    },

    /// Upstream could not be reached or answered with an error
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(#[from] codesync_git::Error),

    /// Target or state file could not be read or written
    #[error("Local I/O failure: {0}")]
    LocalIo(#[from] codesync_fs::Error),

    #[error("Function `{name}` not found in {language} source")]
    FunctionNotFound { language: Language, name: String },

    #[error("Failed to parse {language} source: {message}")]
    ParseError { language: Language, message: String },

    #[error("Patch rejected: hunk {hunk} does not match near line {line}")]
    PatchRejected { hunk: usize, line: usize },

    /// Both sides changed since the last sync
    #[error("Both local and remote have changes for '{item}'. Manual resolution required")]
    Conflict { item: String },

    #[error("No sync state recorded for '{item}'")]
    StateNotFound { item: String },

    #[error("Sync of '{item}' was cancelled")]
    Cancelled { item: String },

    /// Content errors with no dedicated kind
    #[error(transparent)]
    Content(codesync_content::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn item_context(item: &Option<String>) -> String {
    item.as_ref()
        .map(|name| format!(" for item '{name}'"))
        .unwrap_or_default()
}

impl From<codesync_content::Error> for Error {
    fn from(err: codesync_content::Error) -> Self {
        use codesync_content::Error as ContentError;
        match err {
            ContentError::FunctionNotFound { language, name } => {
                Self::FunctionNotFound { language, name }
            }
            ContentError::ParseError { language, message } => Self::ParseError { language, message },
            ContentError::PatchRejected { hunk, line } => Self::PatchRejected { hunk, line },
            ContentError::Fs(e) => Self::LocalIo(e),
            other => Self::Content(other),
        }
    }
}

impl Error {
    pub fn invalid(item: Option<&str>, message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            item: item.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationInvalid { .. } | Self::Yaml(_) => ErrorKind::ConfigurationInvalid,
            Self::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Self::LocalIo(_) | Self::Io(_) => ErrorKind::LocalIo,
            Self::FunctionNotFound { .. } => ErrorKind::FunctionNotFound,
            Self::ParseError { .. } => ErrorKind::ParseError,
            Self::PatchRejected { .. } => ErrorKind::PatchRejected,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::StateNotFound { .. } => ErrorKind::StateNotFound,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Content(_) | Self::Json(_) => ErrorKind::Other,
        }
    }
}
