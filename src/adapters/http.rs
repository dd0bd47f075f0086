use {
    crate::config::Settings,
    crate::domain::error::SessionError,
    reqwest::{Response, StatusCode, Url},
};

pub const DETAILS_FALLBACK_MESSAGE: &str = "Failed to load payment details";

pub fn build_client(settings: &Settings) -> Result<reqwest::Client, SessionError> {
    Ok(reqwest::Client::builder()
        .timeout(settings.http_timeout)
        .build()?)
}

/// `base` with properly encoded query parameters appended.
pub fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    match Url::parse_with_params(base, params) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::warn!(base, error = %e, "unparseable redirect base, using raw form");
            let query = params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            format!("{base}?{query}")
        }
    }
}

/// `base` with `segments` appended to its path. Each segment is percent-encoded, so
/// an identifier can never add path levels or a query of its own.
pub fn with_path(base: &str, segments: &[&str]) -> Result<Url, SessionError> {
    let mut url = Url::parse(base)
        .map_err(|e| SessionError::Config(format!("invalid service url {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| SessionError::Config(format!("service url {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Message from an `{ "error": "..." }` body, when the service sent one.
pub async fn error_message(response: Response) -> Option<String> {
    let body: serde_json::Value = response.json().await.ok()?;
    body.get("error")
        .and_then(|e| e.as_str())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

/// Turn a details response into JSON, mapping any failure to a user-visible message.
pub async fn details_json(
    response: Result<Response, reqwest::Error>,
) -> Result<serde_json::Value, SessionError> {
    let response = response.map_err(|e| {
        tracing::warn!(error = %e, "details request failed");
        SessionError::DetailsFetch(DETAILS_FALLBACK_MESSAGE.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        let message = error_message(response)
            .await
            .unwrap_or_else(|| DETAILS_FALLBACK_MESSAGE.to_string());
        tracing::warn!(%status, error = %message, "details endpoint returned an error");
        return Err(SessionError::DetailsFetch(message));
    }

    response.json().await.map_err(|e| {
        tracing::warn!(error = %e, "details body is not json");
        SessionError::DetailsFetch(DETAILS_FALLBACK_MESSAGE.to_string())
    })
}

pub fn unexpected_status(endpoint: &str, status: StatusCode) -> SessionError {
    SessionError::StatusFetch(format!("{endpoint} returned {status}"))
}
