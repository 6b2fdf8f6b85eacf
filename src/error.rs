use thiserror::Error;

/// Errors that can occur while talking to the codebase service
#[derive(Error, Debug)]
pub enum ClientError {
    /// Missing or blank input, caught before any request is sent
    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("Codebase not found: {directory_id}")]
    NotFound { directory_id: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status
    #[error("HTTP {status}: {status_text}")]
    Remote { status: u16, status_text: String },

    #[error("Invalid response format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ClientError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation {
            message: message.into(),
        }
    }

    /// HTTP status carried by a remote error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            ClientError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
