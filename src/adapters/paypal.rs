use {
    super::http::{error_message, unexpected_status, with_path, with_query},
    crate::domain::{
        error::SessionError,
        gateway::{GatewayFuture, PaymentGateway},
        id::OrderId,
        payment::{PaymentDetails, PaymentStatus, StatusReport},
        session::Outcome,
    },
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentBody<'a> {
    merchant_order_id: &'a str,
    amount: f64,
    currency: &'a str,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentReply {
    #[serde(default)]
    approval_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaypalStatusBody {
    status: String,
}

/// PayPal service. Sessions are keyed by the PayPal payment id or order token,
/// which the service accepts interchangeably.
pub struct PaypalGateway {
    client: reqwest::Client,
    service_url: String,
    front_url: String,
}

impl PaypalGateway {
    pub const DEFAULT_AMOUNT: f64 = 100.0;
    pub const DEFAULT_CURRENCY: &'static str = "USD";

    pub fn new(client: reqwest::Client, service_url: &str, front_url: &str) -> Self {
        Self {
            client,
            service_url: service_url.trim_end_matches('/').to_string(),
            front_url: front_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a PayPal order and return the approval URL the payer is sent to.
    pub async fn create_payment(
        &self,
        order_id: &OrderId,
        amount: Option<f64>,
        currency: Option<&str>,
    ) -> Result<String, SessionError> {
        let amount = amount
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(Self::DEFAULT_AMOUNT);
        let currency = currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(Self::DEFAULT_CURRENCY);

        let body = CreatePaymentBody {
            merchant_order_id: order_id.as_str(),
            amount,
            currency,
            description: format!("Order {order_id}"),
        };

        let response = self
            .client
            .post(format!("{}/payment", self.service_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "paypal create payment request failed");
                SessionError::DetailsFetch("Failed to create PayPal payment".into())
            })?;

        if !response.status().is_success() {
            let message = error_message(response)
                .await
                .unwrap_or_else(|| "Failed to create PayPal payment".to_string());
            return Err(SessionError::DetailsFetch(message));
        }

        let reply: CreatePaymentReply = response.json().await?;
        reply.approval_url.ok_or_else(|| {
            SessionError::DetailsFetch("PayPal did not return an approval link".into())
        })
    }

    async fn status_inner(&self, order_id: &OrderId) -> Result<StatusReport, SessionError> {
        let url = with_path(&self.service_url, &["payment-status", order_id.as_str()])?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(unexpected_status("payment-status", response.status()));
        }

        let body: PaypalStatusBody = response.json().await?;
        Ok(StatusReport::new(PaymentStatus::from_paypal(&body.status)?))
    }
}

impl PaymentGateway for PaypalGateway {
    fn method(&self) -> &'static str {
        "paypal"
    }

    fn fetch_details(&self, _order_id: &OrderId) -> GatewayFuture<'_, Option<PaymentDetails>> {
        Box::pin(async { Ok::<Option<PaymentDetails>, SessionError>(None) })
    }

    fn fetch_status(
        &self,
        order_id: &OrderId,
        _details: Option<&PaymentDetails>,
    ) -> GatewayFuture<'_, StatusReport> {
        let order_id = order_id.clone();
        Box::pin(async move { self.status_inner(&order_id).await })
    }

    fn redirect_for(&self, order_id: &OrderId, outcome: &Outcome) -> String {
        let id = order_id.as_str();
        let cancel = format!("{}/cancel", self.front_url);
        match outcome {
            Outcome::Terminal {
                status: PaymentStatus::Confirmed,
                ..
            } => with_query(&format!("{}/success", self.front_url), &[("paymentId", id)]),
            Outcome::Terminal {
                status: PaymentStatus::Failed,
                ..
            } => with_query(&cancel, &[("token", id), ("reason", "capture_failed")]),
            Outcome::Terminal { .. } => with_query(&cancel, &[("token", id)]),
            Outcome::TimedOut => with_query(&cancel, &[("token", id), ("reason", "payment_not_found")]),
        }
    }
}
