//! HTTP API handlers for veritas-check

pub mod aggregate;
pub mod fact_check;
pub mod health;
pub mod sse;

pub use aggregate::aggregate_routes;
pub use fact_check::fact_check_routes;
pub use health::health_routes;
pub use sse::event_stream;
