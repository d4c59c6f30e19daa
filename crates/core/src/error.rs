use thiserror::Error;

pub type PulseResult<T> = Result<T, PulseError>;

#[derive(Error, Debug)]
pub enum PulseError {
    /// The billing API could not be reached or refused the credentials.
    #[error("Billing API unreachable: {0}")]
    Connectivity(String),

    /// Non-2xx response; `message` is the provider's own description.
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("Unexpected billing API payload: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PulseError {
    /// True for failures that mean "cannot talk to the billing provider".
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            PulseError::Connectivity(_) | PulseError::Request { .. } | PulseError::Decode(_)
        )
    }
}

impl From<config::ConfigError> for PulseError {
    fn from(err: config::ConfigError) -> Self {
        PulseError::Config(err.to_string())
    }
}
