use {
    super::http::{DETAILS_FALLBACK_MESSAGE, details_json, unexpected_status, with_query},
    crate::domain::{
        error::SessionError,
        gateway::{GatewayFuture, PaymentGateway},
        id::{OrderId, PaymentId},
        payment::{PaymentDetails, PaymentStatus, StatusReport},
        session::Outcome,
    },
    serde::Deserialize,
};

#[derive(Debug, Deserialize)]
struct CryptoStatusBody {
    status: String,
    #[serde(default)]
    confirmations: Option<u32>,
}

/// Crypto payments through the PSP: details carry the destination address and
/// the `paymentId` used for status polling.
pub struct CryptoGateway {
    client: reqwest::Client,
    psp_base_url: String,
    shop_url: String,
}

impl CryptoGateway {
    pub fn new(client: reqwest::Client, psp_base_url: &str, shop_url: &str) -> Self {
        Self {
            client,
            psp_base_url: psp_base_url.trim_end_matches('/').to_string(),
            shop_url: shop_url.trim_end_matches('/').to_string(),
        }
    }

    async fn details_inner(&self, order_id: &OrderId) -> Result<PaymentDetails, SessionError> {
        let response = self
            .client
            .get(format!("{}/crypto-payment-details", self.psp_base_url))
            .query(&[("merchantOrderId", order_id.as_str())])
            .send()
            .await;
        let details = PaymentDetails::from_json(details_json(response).await?).map_err(|e| {
            tracing::warn!(error = %e, "crypto details have an unexpected shape");
            SessionError::DetailsFetch(DETAILS_FALLBACK_MESSAGE.to_string())
        })?;

        // Polling is impossible without a valid paymentId.
        match details.payment_id.as_deref().map(PaymentId::new) {
            Some(Ok(_)) => Ok(details),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "crypto details carry a bad paymentId");
                Err(SessionError::DetailsFetch(DETAILS_FALLBACK_MESSAGE.to_string()))
            }
            None => Err(SessionError::DetailsFetch(DETAILS_FALLBACK_MESSAGE.to_string())),
        }
    }

    async fn status_inner(
        &self,
        details: Option<&PaymentDetails>,
    ) -> Result<StatusReport, SessionError> {
        let payment_id = details
            .and_then(|d| d.payment_id.as_deref())
            .ok_or_else(|| SessionError::Validation("crypto session has no paymentId".into()))
            .and_then(PaymentId::new)?;

        let response = self
            .client
            .get(format!("{}/crypto-status", self.psp_base_url))
            .query(&[("paymentId", payment_id.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(unexpected_status("crypto-status", response.status()));
        }

        let body: CryptoStatusBody = response.json().await?;
        let mut report = StatusReport::new(PaymentStatus::try_from(body.status.as_str())?);
        if let Some(confirmations) = body.confirmations {
            report = report.with_confirmations(confirmations);
        }
        Ok(report)
    }
}

impl PaymentGateway for CryptoGateway {
    fn method(&self) -> &'static str {
        "crypto"
    }

    fn fetch_details(&self, order_id: &OrderId) -> GatewayFuture<'_, Option<PaymentDetails>> {
        let order_id = order_id.clone();
        Box::pin(async move { self.details_inner(&order_id).await.map(Some) })
    }

    fn fetch_status(
        &self,
        _order_id: &OrderId,
        details: Option<&PaymentDetails>,
    ) -> GatewayFuture<'_, StatusReport> {
        let details = details.cloned();
        Box::pin(async move { self.status_inner(details.as_ref()).await })
    }

    /// Every terminal status goes back to the shop's payment page, which shows the result.
    fn redirect_for(&self, order_id: &OrderId, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Terminal { .. } => with_query(
                &format!("{}/payment", self.shop_url),
                &[("merchantOrderId", order_id.as_str())],
            ),
            Outcome::TimedOut => format!("{}/payment/fail", self.shop_url),
        }
    }
}
