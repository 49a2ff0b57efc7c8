//! Claim preparation: finalize one claim per post, then derive a search query

pub mod finalizer;
pub mod query_generator;

pub use finalizer::ClaimFinalizer;
pub use query_generator::QueryGenerator;
