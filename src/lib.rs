pub mod adapters;
pub mod config;
pub mod domain;
pub mod services;

use {
    adapters::{
        api_errors::ApiError, card::CardGateway, crypto::CryptoGateway, http::build_client,
        paypal::PaypalGateway,
    },
    config::Settings,
    domain::error::SessionError,
    services::poller::PollConfig,
    std::sync::Arc,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub crypto: Arc<CryptoGateway>,
    pub paypal: Arc<PaypalGateway>,
    pub card: Arc<CardGateway>,
    pub crypto_poll: PollConfig,
    pub paypal_poll: PollConfig,
    pub card_poll: PollConfig,
    shop_url: Arc<str>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, SessionError> {
        let client = build_client(&settings)?;
        Ok(Self {
            crypto: Arc::new(CryptoGateway::new(
                client.clone(),
                &settings.psp_base_url,
                &settings.shop_url,
            )),
            paypal: Arc::new(PaypalGateway::new(
                client.clone(),
                &settings.paypal_service_url,
                &settings.paypal_front_url,
            )),
            card: Arc::new(CardGateway::new(
                client,
                &settings.webshop_base_url,
                &settings.shop_url,
            )),
            crypto_poll: PollConfig::crypto(),
            paypal_poll: PollConfig::paypal(),
            card_poll: PollConfig::card(),
            shop_url: settings.shop_url.as_str().into(),
            settings: Arc::new(settings),
        })
    }

    pub fn api_error(&self, error: SessionError) -> ApiError {
        ApiError::new(error, Arc::clone(&self.shop_url))
    }
}
