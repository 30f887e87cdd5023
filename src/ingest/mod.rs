//! Payload ingestion.
//!
//! Fetching payloads from the analysis service and normalizing them.

pub mod client;
pub mod normalize;

pub use client::ServiceClient;
pub use normalize::{normalize, parse_payload};
