pub mod api_errors;
pub mod card;
pub mod crypto;
pub mod http;
pub mod paypal;
pub mod routes;
pub mod session_feed;
