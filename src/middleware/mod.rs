//! HTTP middleware

pub mod metrics;
pub mod request_id;
