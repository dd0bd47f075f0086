use {
    super::error::SessionError,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Status vocabulary shared by every payment method.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirming,
    Confirmed,
    Expired,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirming => "confirming",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Expired | Self::Failed)
    }

    /// PayPal service statuses. `approved` counts as success for the payer.
    pub fn from_paypal(s: &str) -> Result<Self, SessionError> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" | "completed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Expired),
            "failed" => Ok(Self::Failed),
            other => Err(SessionError::Validation(format!(
                "unknown paypal status: {other}"
            ))),
        }
    }

    /// PSP transaction status codes: SUCCESSFUL, IN_PROGRESS, FAILED, ERROR.
    pub fn from_transaction_code(code: i64) -> Result<Self, SessionError> {
        match code {
            0 => Ok(Self::Confirmed),
            1 => Ok(Self::Confirming),
            2 | 3 => Ok(Self::Failed),
            other => Err(SessionError::Validation(format!(
                "unknown transaction status code: {other}"
            ))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Crypto service statuses map one to one.
impl TryFrom<&str> for PaymentStatus {
    type Error = SessionError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirming" => Ok(Self::Confirming),
            "confirmed" => Ok(Self::Confirmed),
            "expired" => Ok(Self::Expired),
            "failed" => Ok(Self::Failed),
            other => Err(SessionError::Validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// Metadata snapshot fetched once per session. Fields vary by payment method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub payment_id: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub destination_address: Option<String>,
    pub required_confirmations: Option<u32>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub approval_url: Option<String>,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl PaymentDetails {
    pub fn from_json(raw: serde_json::Value) -> Result<Self, SessionError> {
        let mut details: PaymentDetails = serde_json::from_value(raw.clone())?;
        details.raw = raw;
        Ok(details)
    }
}

/// One successful status observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: PaymentStatus,
    pub confirmations: Option<u32>,
    /// Target supplied by the remote service itself (card flow).
    pub redirect_url: Option<String>,
}

impl StatusReport {
    pub fn new(status: PaymentStatus) -> Self {
        Self {
            status,
            confirmations: None,
            redirect_url: None,
        }
    }

    pub fn with_confirmations(mut self, confirmations: u32) -> Self {
        self.confirmations = Some(confirmations);
        self
    }

    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }
}

/// Percentage of required block confirmations seen, always within `[0, 100]`.
pub fn confirmation_progress(confirmations: Option<u32>, required: Option<u32>) -> f64 {
    match (confirmations, required) {
        (Some(seen), Some(required)) if required > 0 => {
            (f64::from(seen) / f64::from(required) * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Wallet URI encoded into the payment QR code.
pub fn payment_uri(details: &PaymentDetails) -> Option<String> {
    let currency = details.currency.as_deref()?;
    let address = details.destination_address.as_deref()?;
    let amount = details.amount?;
    Some(format!(
        "{}:{address}?amount={amount}",
        currency.to_lowercase()
    ))
}

pub fn status_label(
    status: Option<PaymentStatus>,
    confirmations: Option<u32>,
    required: Option<u32>,
) -> String {
    match status {
        None | Some(PaymentStatus::Pending) => "Waiting for payment".to_string(),
        Some(PaymentStatus::Confirming) => format!(
            "Confirming ({}/{})",
            confirmations.unwrap_or(0),
            required.unwrap_or(0)
        ),
        Some(PaymentStatus::Confirmed) => "Payment confirmed".to_string(),
        Some(PaymentStatus::Expired) => "Payment expired".to_string(),
        Some(PaymentStatus::Failed) => "Payment failed".to_string(),
    }
}
