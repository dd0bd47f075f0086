use {
    crate::{
        domain::{gateway::Navigator, payment::payment_uri},
        services::poller::{PollerHandle, SessionSnapshot},
    },
    axum::response::sse::Event,
    futures::{Stream, stream},
    serde_json::json,
    std::sync::Mutex,
    tokio::sync::{oneshot, watch},
};

/// Delivers the session's single navigation to the waiting request.
pub struct RedirectNavigator(Mutex<Option<oneshot::Sender<String>>>);

impl RedirectNavigator {
    pub fn new() -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        (Self(Mutex::new(Some(tx))), rx)
    }
}

impl Navigator for RedirectNavigator {
    fn navigate(&self, target: &str) {
        let sender = self.0.lock().ok().and_then(|mut slot| slot.take());
        match sender {
            Some(tx) => {
                if tx.send(target.to_string()).is_err() {
                    tracing::debug!(target, "payer left before redirect");
                }
            }
            None => tracing::warn!(target, "duplicate navigation ignored"),
        }
    }
}

enum Stage {
    Details,
    Live,
    Done,
}

/// Server-sent events for one running session: `details` once, then `status` on
/// every snapshot change (countdown included), then a final `redirect`.
/// The feed owns the handle, so a disconnected payer stops the session.
pub struct SessionFeed {
    handle: PollerHandle,
    updates: watch::Receiver<SessionSnapshot>,
    navigated: oneshot::Receiver<String>,
    stage: Stage,
}

impl SessionFeed {
    pub fn new(handle: PollerHandle, navigated: oneshot::Receiver<String>) -> Self {
        let updates = handle.subscribe();
        Self {
            handle,
            updates,
            navigated,
            stage: Stage::Details,
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Event, axum::Error>> {
        stream::unfold(self, |mut feed| async move {
            let event = feed.next_event().await?;
            Some((event, feed))
        })
    }

    async fn next_event(&mut self) -> Option<Result<Event, axum::Error>> {
        match self.stage {
            Stage::Done => None,
            Stage::Details => {
                self.stage = Stage::Live;
                let snapshot = self.updates.borrow_and_update().clone();
                Some(details_event(&self.handle, &snapshot))
            }
            Stage::Live => tokio::select! {
                biased;
                target = &mut self.navigated => {
                    self.stage = Stage::Done;
                    let url = target.ok()?;
                    tracing::info!(order_id = %self.handle.order_id(), target = %url, "redirect sent to payer");
                    Some(Event::default().event("redirect").json_data(json!({ "url": url })))
                }
                changed = self.updates.changed() => {
                    if changed.is_err() {
                        // Driver finished without navigating.
                        self.stage = Stage::Done;
                        return None;
                    }
                    let snapshot = self.updates.borrow_and_update().clone();
                    Some(status_event(&snapshot))
                }
            },
        }
    }
}

fn details_event(handle: &PollerHandle, snapshot: &SessionSnapshot) -> Result<Event, axum::Error> {
    let details = handle.details();
    let mut body = details
        .map(serde_json::to_value)
        .transpose()
        .map_err(axum::Error::new)?
        .unwrap_or_else(|| json!({}));

    if let Some(fields) = body.as_object_mut() {
        fields.insert("orderId".into(), json!(handle.order_id()));
        fields.insert("paymentUri".into(), json!(details.and_then(payment_uri)));
        fields.insert("status".into(), snapshot_json(snapshot));
    }
    Event::default().event("details").json_data(body)
}

fn status_event(snapshot: &SessionSnapshot) -> Result<Event, axum::Error> {
    Event::default()
        .event("status")
        .json_data(snapshot_json(snapshot))
}

fn snapshot_json(snapshot: &SessionSnapshot) -> serde_json::Value {
    json!({
        "state": snapshot.state,
        "status": snapshot.status,
        "confirmations": snapshot.confirmations,
        "requiredConfirmations": snapshot.required_confirmations,
        "progress": snapshot.progress,
        "label": snapshot.label,
        "remaining": snapshot.remaining_display(),
        "polls": snapshot.polls,
    })
}

