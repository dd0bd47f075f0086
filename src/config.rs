use {
    crate::domain::error::SessionError,
    std::{env, net::SocketAddr, time::Duration},
};

/// Base URLs of the remote services and the redirect origins. All of these are
/// deployment concerns and come from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub psp_base_url: String,
    pub paypal_service_url: String,
    pub paypal_front_url: String,
    pub webshop_base_url: String,
    pub shop_url: String,
    pub bind_addr: SocketAddr,
    /// Per outbound request.
    pub http_timeout: Duration,
    /// Upper bound on one inbound request, i.e. one whole session.
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, SessionError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SessionError> {
        let url = |key: &str, default: &str| -> Result<String, SessionError> {
            let value = lookup(key).unwrap_or_else(|| default.to_string());
            let value = value.trim().trim_end_matches('/').to_string();
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(SessionError::Config(format!(
                    "{key} must be an http(s) URL, got: {value}"
                )));
            }
            Ok(value)
        };

        let secs = |key: &str, default: u64| -> Result<Duration, SessionError> {
            match lookup(key) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|&s| s > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        SessionError::Config(format!("{key} must be a positive integer, got: {raw}"))
                    }),
            }
        };

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3005".to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e| SessionError::Config(format!("BIND_ADDR {bind_raw}: {e}")))?;

        Ok(Self {
            psp_base_url: url("PSP_BASE_URL", "http://localhost")?,
            paypal_service_url: url("PAYPAL_SERVICE_URL", "http://localhost:8088")?,
            paypal_front_url: url("PAYPAL_FRONT_URL", "http://localhost:3003")?,
            webshop_base_url: url("WEBSHOP_BASE_URL", "http://localhost:8080")?,
            shop_url: url("SHOP_URL", "http://localhost:3000")?,
            bind_addr,
            http_timeout: secs("HTTP_TIMEOUT_SECS", 10)?,
            // Crypto payment windows run for 30 minutes.
            request_timeout: secs("REQUEST_TIMEOUT_SECS", 31 * 60)?,
        })
    }
}
