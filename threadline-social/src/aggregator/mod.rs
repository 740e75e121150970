//! Aggregator API surface exposed to the pipeline.
//!
//! Submodules provide advanced-search query construction, the HTTP client
//! wrapper, and strongly typed response models.
pub mod client;
pub mod query;
pub mod types;

pub use client::AggregatorClient;
