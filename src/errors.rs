use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Analytics request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Analytics payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Analytics delivery failed: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Enter a deposit amount")]
    EmptyAmount,
    #[error("Submission already confirmed")]
    AlreadyConfirmed,
    #[error("Submission already in progress")]
    SubmitInProgress,
    #[error("Could not send the deposit, try again")]
    DeliveryFailed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{flag} must be an http(s) URL, got {value:?}")]
    InvalidEndpoint { flag: &'static str, value: String },
    #[error("--port must be > 0")]
    InvalidPort,
}
