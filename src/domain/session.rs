use {
    super::id::OrderId,
    super::payment::{PaymentDetails, PaymentStatus, StatusReport},
    serde::Serialize,
    std::{fmt, time::Duration},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Ready,
    Pending,
    Confirming,
    Confirmed,
    Expired,
    Failed,
    Redirected,
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Pending => "pending",
            Self::Confirming => "confirming",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
            Self::Failed => "failed",
            Self::Redirected => "redirected",
            Self::Error => "error",
        }
    }

    fn from_status(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Confirming => Self::Confirming,
            PaymentStatus::Confirmed => Self::Confirmed,
            PaymentStatus::Expired => Self::Expired,
            PaymentStatus::Failed => Self::Failed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final redirect decision, set once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Terminal {
        status: PaymentStatus,
        redirect_url: Option<String>,
    },
    TimedOut,
}

impl Outcome {
    /// How long the final state stays on screen before navigating away.
    pub fn display_delay(&self, confirmed: Duration, failed: Duration) -> Duration {
        match self {
            Self::Terminal {
                status: PaymentStatus::Confirmed,
                ..
            } => confirmed,
            Self::Terminal { .. } => failed,
            Self::TimedOut => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    DetailsLoaded(Option<PaymentDetails>),
    DetailsFailed(String),
    StatusObserved(StatusReport),
    StatusFetchFailed(String),
    /// One poll interval has passed.
    Tick(Duration),
    Redirected,
}

/// What the driver should do after applying an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Poll,
    Wait,
    Finish(Outcome),
    /// Session entered `Error`; nothing further happens.
    Halt,
    Ignored,
}

/// Per page-load payment session. Mutated only through [`PaymentSession::apply`].
#[derive(Debug, Clone)]
pub struct PaymentSession {
    order_id: OrderId,
    details: Option<PaymentDetails>,
    status: Option<PaymentStatus>,
    confirmations: Option<u32>,
    elapsed: Duration,
    max_wait: Option<Duration>,
    state: SessionState,
    outcome: Option<Outcome>,
    last_error: Option<String>,
}

impl PaymentSession {
    pub fn new(order_id: OrderId, max_wait: Option<Duration>) -> Self {
        Self {
            order_id,
            details: None,
            status: None,
            confirmations: None,
            elapsed: Duration::ZERO,
            max_wait,
            state: SessionState::Loading,
            outcome: None,
            last_error: None,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn details(&self) -> Option<&PaymentDetails> {
        self.details.as_ref()
    }

    pub fn status(&self) -> Option<PaymentStatus> {
        self.status
    }

    pub fn confirmations(&self) -> Option<u32> {
        self.confirmations
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply(&mut self, event: SessionEvent) -> Step {
        use SessionState::*;

        // First outcome wins; later responses only count as the redirect.
        if self.outcome.is_some() && !matches!(event, SessionEvent::Redirected) {
            return Step::Ignored;
        }

        match (self.state, event) {
            (Loading, SessionEvent::DetailsLoaded(details)) => {
                self.details = details;
                self.state = Ready;
                Step::Poll
            }
            (Loading, SessionEvent::DetailsFailed(msg)) => {
                self.last_error = Some(msg);
                self.state = Error;
                Step::Halt
            }
            (Ready | Pending | Confirming, SessionEvent::StatusObserved(report)) => {
                self.status = Some(report.status);
                if report.confirmations.is_some() {
                    self.confirmations = report.confirmations;
                }
                self.state = SessionState::from_status(report.status);

                if report.status.is_terminal() {
                    let outcome = Outcome::Terminal {
                        status: report.status,
                        redirect_url: report.redirect_url,
                    };
                    self.outcome = Some(outcome.clone());
                    Step::Finish(outcome)
                } else {
                    Step::Wait
                }
            }
            (Ready | Pending | Confirming, SessionEvent::StatusFetchFailed(msg)) => {
                self.last_error = Some(msg);
                Step::Wait
            }
            (Ready | Pending | Confirming, SessionEvent::Tick(interval)) => {
                self.elapsed += interval;
                match self.max_wait {
                    Some(max) if self.elapsed >= max => {
                        self.outcome = Some(Outcome::TimedOut);
                        Step::Finish(Outcome::TimedOut)
                    }
                    _ => Step::Poll,
                }
            }
            (state, SessionEvent::Redirected) if self.outcome.is_some() && state != Redirected => {
                self.state = Redirected;
                Step::Wait
            }
            _ => Step::Ignored,
        }
    }
}
