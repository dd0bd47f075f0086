use {
    super::http::{unexpected_status, with_query},
    crate::domain::{
        error::SessionError,
        gateway::{GatewayFuture, PaymentGateway},
        id::OrderId,
        payment::{PaymentDetails, PaymentStatus, StatusReport},
        session::Outcome,
    },
    reqwest::StatusCode,
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckBody<'a> {
    merchant_order_id: &'a str,
}

/// Purchase status as recorded by the webshop once the PSP reports back.
#[derive(Debug, Deserialize)]
struct CheckReply {
    #[serde(default)]
    url: Option<String>,
    /// PSP transaction status code, when the webshop forwards it.
    #[serde(default)]
    status: Option<i64>,
}

/// Generic card flow: the webshop answers with the final page URL once the
/// purchase status is known.
pub struct CardGateway {
    client: reqwest::Client,
    webshop_base_url: String,
    shop_url: String,
}

impl CardGateway {
    pub fn new(client: reqwest::Client, webshop_base_url: &str, shop_url: &str) -> Self {
        Self {
            client,
            webshop_base_url: webshop_base_url.trim_end_matches('/').to_string(),
            shop_url: shop_url.trim_end_matches('/').to_string(),
        }
    }

    async fn status_inner(&self, order_id: &OrderId) -> Result<StatusReport, SessionError> {
        let response = self
            .client
            .post(format!("{}/purchase-status/check", self.webshop_base_url))
            .json(&CheckBody {
                merchant_order_id: order_id.as_str(),
            })
            .send()
            .await?;

        match response.status() {
            // No purchase status recorded yet.
            StatusCode::NOT_FOUND => Ok(StatusReport::new(PaymentStatus::Pending)),
            s if s.is_success() => {
                let reply: CheckReply = response.json().await?;
                // A blank url carries no decision.
                let url = reply.url.filter(|url| !url.trim().is_empty());
                let status = match reply.status {
                    Some(code) => PaymentStatus::from_transaction_code(code)?,
                    None if url.is_some() => PaymentStatus::Confirmed,
                    None => PaymentStatus::Pending,
                };
                let report = StatusReport::new(status);
                Ok(match url {
                    Some(url) => report.with_redirect(url),
                    None => report,
                })
            }
            s => Err(unexpected_status("purchase-status/check", s)),
        }
    }
}

impl PaymentGateway for CardGateway {
    fn method(&self) -> &'static str {
        "card"
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
        match outcome {
            Outcome::Terminal {
                redirect_url: Some(url),
                ..
            } => url.clone(),
            Outcome::Terminal {
                status: PaymentStatus::Confirmed,
                ..
            } => with_query(
                &format!("{}/payment/success", self.shop_url),
                &[("merchantOrderId", order_id.as_str())],
            ),
            Outcome::Terminal { .. } | Outcome::TimedOut => {
                format!("{}/payment/fail", self.shop_url)
            }
        }
    }
}
