use {
    super::error::SessionError,
    super::id::OrderId,
    super::payment::{PaymentDetails, StatusReport},
    super::session::Outcome,
    std::{future::Future, pin::Pin},
};

pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionError>> + Send + 'a>>;

/// Remote payment service a session observes. One implementation per payment method.
pub trait PaymentGateway: Send + Sync {
    /// Short name used in logs (`crypto`, `paypal`, `card`).
    fn method(&self) -> &'static str;

    /// Fetch the metadata snapshot. `Ok(None)` when the method has nothing to pre-fetch.
    fn fetch_details(&self, order_id: &OrderId) -> GatewayFuture<'_, Option<PaymentDetails>>;

    fn fetch_status(
        &self,
        order_id: &OrderId,
        details: Option<&PaymentDetails>,
    ) -> GatewayFuture<'_, StatusReport>;

    /// Target URL for the single navigation that ends a session.
    fn redirect_for(&self, order_id: &OrderId, outcome: &Outcome) -> String;
}

/// Leaves the page. Called at most once per session.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}
