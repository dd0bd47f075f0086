use {
    chrono::{DateTime, Utc},
    std::time::Duration,
};

/// Time left until `expiry`, clamped to zero once it has passed.
pub fn remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (expiry - now).to_std().unwrap_or(Duration::ZERO)
}

/// `m:ss`, minutes unbounded.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
