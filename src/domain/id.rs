use {
    super::error::SessionError,
    derive_more::Display,
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Merchant order identifier taken from the incoming `merchantOrderId` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Result<Self, SessionError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(SessionError::MissingIdentifier);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Absent query parameter and empty value are the same failure.
    pub fn from_query(value: Option<&str>) -> Result<Self, SessionError> {
        Self::new(value.unwrap_or_default())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Crypto payment identifier issued by the crypto service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    pub fn new(id: &str) -> Result<Self, SessionError> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|e| SessionError::Validation(format!("invalid paymentId {id}: {e}")))
    }
}
