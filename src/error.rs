use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthBundleError {
    #[error("Payload error: {message}")]
    Payload { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Generation error: {message}")]
    Generation { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl SynthBundleError {
    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Payload { .. } | Self::InvalidRequest { .. })
    }
}

pub type Result<T> = std::result::Result<T, SynthBundleError>;
