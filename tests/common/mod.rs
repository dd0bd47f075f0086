#![allow(dead_code)]

use payment_poller::config::Settings;
use payment_poller::domain::error::SessionError;
use payment_poller::domain::gateway::{GatewayFuture, Navigator, PaymentGateway};
use payment_poller::domain::id::OrderId;
use payment_poller::domain::payment::{PaymentDetails, PaymentStatus, StatusReport};
use payment_poller::domain::session::Outcome;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// One scripted answer of the status endpoint.
#[derive(Debug, Clone)]
pub enum Scripted {
    Report(StatusReport),
    Fail(String),
    /// Answer arrives only after the given delay.
    Delayed(Duration, StatusReport),
}

pub fn report(status: PaymentStatus) -> Scripted {
    Scripted::Report(StatusReport::new(status))
}

pub fn confirming(confirmations: u32) -> Scripted {
    Scripted::Report(StatusReport::new(PaymentStatus::Confirming).with_confirmations(confirmations))
}

/// Gateway answering from a script. Once the script runs dry every poll reports `Pending`.
pub struct ScriptedGateway {
    details: Result<Option<PaymentDetails>, String>,
    script: Mutex<VecDeque<Scripted>>,
    pub details_calls: AtomicU32,
    pub status_calls: AtomicU32,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            details: Ok(None),
            script: Mutex::new(script.into()),
            details_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
        }
    }

    pub fn with_details(mut self, details: PaymentDetails) -> Self {
        self.details = Ok(Some(details));
        self
    }

    pub fn with_details_error(mut self, message: &str) -> Self {
        self.details = Err(message.to_string());
        self
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> u32 {
        self.details_calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for ScriptedGateway {
    fn method(&self) -> &'static str {
        "scripted"
    }

    fn fetch_details(&self, _order_id: &OrderId) -> GatewayFuture<'_, Option<PaymentDetails>> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.details.clone().map_err(SessionError::DetailsFetch);
        Box::pin(async move { result })
    }

    fn fetch_status(
        &self,
        _order_id: &OrderId,
        _details: Option<&PaymentDetails>,
    ) -> GatewayFuture<'_, StatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| report(PaymentStatus::Pending));
        Box::pin(async move {
            match next {
                Scripted::Report(report) => Ok(report),
                Scripted::Fail(msg) => Err(SessionError::StatusFetch(msg)),
                Scripted::Delayed(delay, report) => {
                    tokio::time::sleep(delay).await;
                    Ok(report)
                }
            }
        })
    }

    fn redirect_for(&self, _order_id: &OrderId, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Terminal { status, .. } => format!("/{status}"),
            Outcome::TimedOut => "/timeout".to_string(),
        }
    }
}

/// Records every navigation with the (tokio) time it happened.
#[derive(Default)]
pub struct RecordingNavigator {
    pub targets: Mutex<Vec<(String, Instant)>>,
}

impl RecordingNavigator {
    pub fn targets(&self) -> Vec<String> {
        self.targets
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }

    pub fn navigated_at(&self) -> Vec<Instant> {
        self.targets.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        self.targets
            .lock()
            .unwrap()
            .push((target.to_string(), Instant::now()));
    }
}

pub fn btc_details(required: u32) -> PaymentDetails {
    PaymentDetails {
        payment_id: Some("7f1b0c1e-2d3a-4b5c-8d9e-0f1a2b3c4d5e".into()),
        amount: Some(100.0),
        currency: Some("BTC".into()),
        destination_address: Some("tb1qexampleaddress".into()),
        required_confirmations: Some(required),
        ..PaymentDetails::default()
    }
}

/// Spawn `router` on an ephemeral port and return its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Settings pointing every remote service at `base`.
pub fn settings_for(base: &str) -> Settings {
    let base = base.to_string();
    Settings::from_lookup(|key| match key {
        "PSP_BASE_URL" | "PAYPAL_SERVICE_URL" | "WEBSHOP_BASE_URL" => Some(base.clone()),
        "SHOP_URL" => Some("http://shop.test".into()),
        "PAYPAL_FRONT_URL" => Some("http://paypal-front.test".into()),
        "HTTP_TIMEOUT_SECS" => Some("5".into()),
        _ => None,
    })
    .unwrap()
}
