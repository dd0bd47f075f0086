pub mod countdown;
pub mod error;
pub mod gateway;
pub mod id;
pub mod payment;
pub mod session;
