use {
    crate::domain::countdown::format_remaining,
    crate::domain::error::SessionError,
    crate::domain::gateway::{Navigator, PaymentGateway},
    crate::domain::id::OrderId,
    crate::domain::payment::{
        PaymentDetails, PaymentStatus, StatusReport, confirmation_progress, status_label,
    },
    crate::domain::session::{Outcome, PaymentSession, SessionEvent, SessionState, Step},
    crate::services::countdown::run_countdown,
    std::{sync::Arc, time::Duration},
    tokio::{
        sync::watch,
        task::{JoinHandle, JoinSet},
        time::{Instant, MissedTickBehavior},
    },
    tracing::Instrument,
    uuid::Uuid,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub poll_interval: Duration,
    /// `None` polls until a terminal status or `stop`.
    pub max_wait: Option<Duration>,
    pub confirmed_delay: Duration,
    pub failed_delay: Duration,
}

impl PollConfig {
    pub fn crypto() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_wait: None,
            confirmed_delay: Duration::from_millis(2000),
            failed_delay: Duration::from_millis(3000),
        }
    }

    pub fn paypal() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            ..Self::crypto()
        }
    }

    /// Card flow gives up after 30s and redirects straight away.
    pub fn card() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Some(Duration::from_secs(30)),
            confirmed_delay: Duration::ZERO,
            failed_delay: Duration::ZERO,
        }
    }
}

/// Point-in-time view of a running session, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub status: Option<PaymentStatus>,
    pub confirmations: Option<u32>,
    pub required_confirmations: Option<u32>,
    pub progress: f64,
    pub label: String,
    /// Written by the countdown ticker only.
    pub remaining: Option<Duration>,
    pub polls: u32,
}

impl SessionSnapshot {
    fn capture(session: &PaymentSession, polls: u32, remaining: Option<Duration>) -> Self {
        let required = session.details().and_then(|d| d.required_confirmations);
        Self {
            state: session.state(),
            status: session.status(),
            confirmations: session.confirmations(),
            required_confirmations: required,
            progress: confirmation_progress(session.confirmations(), required),
            label: status_label(session.status(), session.confirmations(), required),
            remaining,
            polls,
        }
    }

    pub fn remaining_display(&self) -> Option<String> {
        self.remaining.map(format_remaining)
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub order_id: OrderId,
    pub state: SessionState,
    pub outcome: Option<Outcome>,
    /// Set only when the navigation actually happened.
    pub navigated_to: Option<String>,
    pub polls: u32,
    pub elapsed: Duration,
}

pub struct PaymentStatusPoller {
    gateway: Arc<dyn PaymentGateway>,
    navigator: Arc<dyn Navigator>,
}

impl PaymentStatusPoller {
    pub fn new(gateway: Arc<dyn PaymentGateway>, navigator: Arc<dyn Navigator>) -> Self {
        Self { gateway, navigator }
    }

    /// Validate the identifier, fetch details once, then hand the session to a
    /// background driver. Errors here mean no polling was started.
    pub async fn start(
        &self,
        identifier: &str,
        config: PollConfig,
    ) -> Result<PollerHandle, SessionError> {
        let order_id = OrderId::new(identifier)?;
        let session_id = Uuid::now_v7();
        let method = self.gateway.method();
        let span = tracing::info_span!("payment_session", %session_id, %order_id, method);

        let mut session = PaymentSession::new(order_id.clone(), config.max_wait);

        let details = match self
            .gateway
            .fetch_details(&order_id)
            .instrument(span.clone())
            .await
        {
            Ok(details) => details,
            Err(e) => {
                let message = match e {
                    SessionError::DetailsFetch(msg) => msg,
                    other => {
                        tracing::warn!(parent: &span, error = %other, "details fetch failed");
                        "Failed to load payment details".to_string()
                    }
                };
                session.apply(SessionEvent::DetailsFailed(message.clone()));
                tracing::warn!(parent: &span, error = %message, "session entered error state");
                return Err(SessionError::DetailsFetch(message));
            }
        };

        let step = session.apply(SessionEvent::DetailsLoaded(details));
        debug_assert_eq!(step, Step::Poll);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let snapshot = Arc::new(watch::Sender::new(SessionSnapshot::capture(
            &session, 0, None,
        )));
        let snapshot_rx = snapshot.subscribe();

        let driver = Driver {
            gateway: Arc::clone(&self.gateway),
            navigator: Arc::clone(&self.navigator),
            config,
            shutdown: shutdown_rx,
            snapshot,
            polls: 0,
        };

        let details = session.details().cloned();
        tracing::info!(parent: &span, "payment session started");
        let task = tokio::spawn(driver.run(session).instrument(span));

        Ok(PollerHandle {
            order_id,
            details,
            shutdown: shutdown_tx,
            snapshot: snapshot_rx,
            driver: Some(task),
        })
    }
}

/// Owner-side handle of a running session. Dropping it stops the session.
pub struct PollerHandle {
    order_id: OrderId,
    details: Option<PaymentDetails>,
    shutdown: watch::Sender<bool>,
    snapshot: watch::Receiver<SessionSnapshot>,
    driver: Option<JoinHandle<SessionReport>>,
}

impl PollerHandle {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Details fetched when the session started, if the method has any.
    pub fn details(&self) -> Option<&PaymentDetails> {
        self.details.as_ref()
    }

    /// Cancel both timers. Safe to call any number of times.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Wait for the driver to finish, either through an outcome or `stop`.
    pub async fn wait(mut self) -> SessionReport {
        let last = self.snapshot();
        let Some(driver) = self.driver.take() else {
            return self.fallback_report(last);
        };

        match driver.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(order_id = %self.order_id, error = %e, "session driver aborted");
                self.fallback_report(last)
            }
        }
    }

    fn fallback_report(&self, last: SessionSnapshot) -> SessionReport {
        SessionReport {
            order_id: self.order_id.clone(),
            state: last.state,
            outcome: None,
            navigated_to: None,
            polls: last.polls,
            elapsed: Duration::ZERO,
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Driver {
    gateway: Arc<dyn PaymentGateway>,
    navigator: Arc<dyn Navigator>,
    config: PollConfig,
    shutdown: watch::Receiver<bool>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    polls: u32,
}

impl Driver {
    async fn run(mut self, mut session: PaymentSession) -> SessionReport {
        let countdown = session
            .details()
            .and_then(|d| d.expiry_time)
            .map(|expiry| {
                tokio::spawn(run_countdown(
                    expiry,
                    Arc::clone(&self.snapshot),
                    self.shutdown.clone(),
                ))
            });

        let report = self.drive(&mut session).await;

        if let Some(countdown) = countdown {
            countdown.abort();
        }
        report
    }

    async fn drive(&mut self, session: &mut PaymentSession) -> SessionReport {
        let interval = self.config.poll_interval;
        let mut inflight: JoinSet<Result<StatusReport, SessionError>> = JoinSet::new();
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.spawn_poll(&mut inflight, session);

        let outcome = loop {
            let step = tokio::select! {
                biased;
                _ = stopped(&mut self.shutdown) => {
                    tracing::info!(polls = self.polls, "payment session stopped");
                    inflight.abort_all();
                    return self.report(session, None);
                }
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    session.apply(status_event(joined))
                }
                _ = ticker.tick() => {
                    session.apply(SessionEvent::Tick(interval))
                }
            };

            match step {
                Step::Poll => self.spawn_poll(&mut inflight, session),
                Step::Finish(outcome) => break outcome,
                Step::Wait | Step::Halt | Step::Ignored => {}
            }
            self.publish(session);
        };

        // Poll timer is cancelled before the delayed redirect can fire.
        inflight.abort_all();
        drop(ticker);
        self.publish(session);

        let target = self.gateway.redirect_for(session.order_id(), &outcome);
        let delay = outcome.display_delay(self.config.confirmed_delay, self.config.failed_delay);
        tracing::info!(
            ?outcome,
            target = %target,
            delay_ms = delay.as_millis() as u64,
            elapsed_ms = session.elapsed().as_millis() as u64,
            "payment session resolved"
        );

        tokio::select! {
            biased;
            _ = stopped(&mut self.shutdown) => {
                tracing::info!("payment session stopped before redirect");
                return self.report(session, None);
            }
            _ = tokio::time::sleep(delay) => {}
        }

        self.navigator.navigate(&target);
        session.apply(SessionEvent::Redirected);
        self.publish(session);
        self.report(session, Some(target))
    }

    fn spawn_poll(
        &mut self,
        inflight: &mut JoinSet<Result<StatusReport, SessionError>>,
        session: &PaymentSession,
    ) {
        self.polls += 1;
        let gateway = Arc::clone(&self.gateway);
        let order_id = session.order_id().clone();
        let details = session.details().cloned();
        tracing::debug!(poll = self.polls, "polling payment status");
        inflight.spawn(
            async move { gateway.fetch_status(&order_id, details.as_ref()).await }
                .in_current_span(),
        );
    }

    fn publish(&self, session: &PaymentSession) {
        let polls = self.polls;
        self.snapshot.send_modify(|snapshot| {
            *snapshot = SessionSnapshot::capture(session, polls, snapshot.remaining);
        });
    }

    fn report(&self, session: &PaymentSession, navigated_to: Option<String>) -> SessionReport {
        SessionReport {
            order_id: session.order_id().clone(),
            state: session.state(),
            outcome: session.outcome().cloned(),
            navigated_to,
            polls: self.polls,
            elapsed: session.elapsed(),
        }
    }
}

/// Failures are logged and swallowed; the next tick tries again.
fn status_event(
    joined: Result<Result<StatusReport, SessionError>, tokio::task::JoinError>,
) -> SessionEvent {
    match joined {
        Ok(Ok(report)) => {
            tracing::debug!(status = %report.status, confirmations = ?report.confirmations, "status observed");
            SessionEvent::StatusObserved(report)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "status poll failed");
            SessionEvent::StatusFetchFailed(e.to_string())
        }
        Err(e) => {
            tracing::warn!(error = %e, "status poll task failed");
            SessionEvent::StatusFetchFailed(e.to_string())
        }
    }
}

/// Resolves once `stop` was called or the handle is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}
