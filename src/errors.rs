use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhoisError {
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid server spec: {0}")]
    InvalidServerSpec(String),

    #[error("Malformed server table line {line}: {content:?}")]
    MalformedTableLine { line: usize, content: String },

    #[error("Duplicate suffix {suffix:?} in server table at line {line}")]
    DuplicateSuffix { line: usize, suffix: String },

    #[error("Network timeout")]
    Timeout,

    #[error("Response too large")]
    ResponseTooLarge,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl From<tokio::time::error::Elapsed> for WhoisError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        WhoisError::Timeout
    }
}
