use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing payment identifier")]
    MissingIdentifier,

    /// Carries the user-visible message.
    #[error("details fetch: {0}")]
    DetailsFetch(String),

    #[error("status fetch: {0}")]
    StatusFetch(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),
}

impl SessionError {
    /// Message safe to show to the payer.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingIdentifier => "Invalid payment link".to_string(),
            Self::DetailsFetch(msg) => msg.clone(),
            Self::Validation(msg) => msg.clone(),
            _ => "Something went wrong, please try again".to_string(),
        }
    }
}
