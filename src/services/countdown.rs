use {
    super::poller::SessionSnapshot,
    crate::domain::countdown::remaining,
    chrono::{DateTime, Utc},
    std::{sync::Arc, time::Duration},
    tokio::sync::watch,
};

/// Publish time left until `expiry` once per second, independent of the poll timer.
/// Ends on shutdown or once the clock reaches zero.
pub async fn run_countdown(
    expiry: DateTime<Utc>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait_for(|stopped| *stopped) => return,
            _ = ticker.tick() => {}
        }

        let left = remaining(expiry, Utc::now());
        snapshot.send_modify(|s| s.remaining = Some(left));

        if left.is_zero() {
            tracing::debug!("payment window expired");
            return;
        }
    }
}
