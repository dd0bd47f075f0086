use {
    crate::{
        AppState,
        adapters::{
            api_errors::ApiError,
            session_feed::{RedirectNavigator, SessionFeed},
        },
        domain::{error::SessionError, gateway::PaymentGateway, id::OrderId},
        services::poller::{PaymentStatusPoller, PollConfig},
    },
    axum::{
        Router,
        extract::{Query, State},
        response::{
            Redirect,
            sse::{Event, KeepAlive, Sse},
        },
        routing::get,
    },
    futures::Stream,
    std::{collections::HashMap, sync::Arc},
};

type Params = Query<HashMap<String, String>>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/crypto/payment", get(crypto_payment))
        .route("/crypto/payment/events", get(crypto_events))
        .route("/payment", get(card_payment))
        .route("/paypal/checkout", get(paypal_checkout))
        .route("/paypal/success", get(paypal_success))
        .with_state(state)
}

pub async fn crypto_payment(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Redirect, ApiError> {
    let order_id = order_id(&state, param(&params, "merchantOrderId"))?;
    let gateway: Arc<dyn PaymentGateway> = state.crypto.clone();
    let config = state.crypto_poll.clone();
    run_session(&state, gateway, &order_id, config).await
}

/// Live crypto payment page: address, amount and wallet URI first, then status
/// and countdown updates, then the redirect target.
pub async fn crypto_events(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let order_id = order_id(&state, param(&params, "merchantOrderId"))?;
    let (navigator, navigated) = RedirectNavigator::new();
    let handle = PaymentStatusPoller::new(state.crypto.clone(), Arc::new(navigator))
        .start(order_id.as_str(), state.crypto_poll.clone())
        .await
        .map_err(|e| state.api_error(e))?;

    let feed = SessionFeed::new(handle, navigated);
    Ok(Sse::new(feed.into_stream()).keep_alive(KeepAlive::default()))
}

pub async fn card_payment(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Redirect, ApiError> {
    let order_id = order_id(&state, param(&params, "merchantOrderId"))?;
    let gateway: Arc<dyn PaymentGateway> = state.card.clone();
    let config = state.card_poll.clone();
    run_session(&state, gateway, &order_id, config).await
}

/// PayPal returns the payer with either `paymentId` or the order `token`.
pub async fn paypal_success(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Redirect, ApiError> {
    let id = param(&params, "paymentId").or_else(|| param(&params, "token"));
    let order_id = order_id(&state, id)?;
    let gateway: Arc<dyn PaymentGateway> = state.paypal.clone();
    let config = state.paypal_poll.clone();
    run_session(&state, gateway, &order_id, config).await
}

pub async fn paypal_checkout(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Redirect, ApiError> {
    let order_id = order_id(&state, param(&params, "merchantOrderId"))?;
    let amount = params.get("amount").and_then(|a| a.parse::<f64>().ok());
    let currency = params.get("currency").map(String::as_str);

    let approval_url = state
        .paypal
        .create_payment(&order_id, amount, currency)
        .await
        .map_err(|e| state.api_error(e))?;

    tracing::info!(%order_id, "sending payer to paypal approval");
    Ok(Redirect::to(&approval_url))
}

/// Blank values count as absent.
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
}

fn order_id(state: &AppState, value: Option<&str>) -> Result<OrderId, ApiError> {
    OrderId::from_query(value).map_err(|e| state.api_error(e))
}

/// Run one session for the lifetime of the request. If the payer disconnects the
/// handler future is dropped, which drops the handle and stops the session.
async fn run_session(
    state: &AppState,
    gateway: Arc<dyn PaymentGateway>,
    order_id: &OrderId,
    config: PollConfig,
) -> Result<Redirect, ApiError> {
    let (navigator, navigated) = RedirectNavigator::new();
    let poller = PaymentStatusPoller::new(gateway, Arc::new(navigator));
    let handle = poller
        .start(order_id.as_str(), config)
        .await
        .map_err(|e| state.api_error(e))?;
    // Only the driver may keep the navigator alive from here on.
    drop(poller);

    match navigated.await {
        Ok(target) => {
            let report = handle.wait().await;
            tracing::info!(
                order_id = %report.order_id,
                polls = report.polls,
                state = %report.state,
                "redirecting payer"
            );
            Ok(Redirect::to(&target))
        }
        Err(_) => {
            let report = handle.wait().await;
            Err(state.api_error(SessionError::StatusFetch(format!(
                "session ended in state {} without a redirect",
                report.state
            ))))
        }
    }
}
