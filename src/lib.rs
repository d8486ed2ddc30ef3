//! itemetrics - in-memory item service with Prometheus request metrics
//!
//! Serves CRUD operations over a collection of named items. Every request
//! passes through an interceptor that records request counts, latency
//! histograms and an in-flight gauge, exposed at `/metrics`.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod store;
pub mod telemetry;
