//! Gateway HTTP plumbing: client options, the read-only collection
//! endpoints, and the `PageClient` trait consumed by the aggregator.

pub mod client;
pub mod options;

pub use client::{CollectionPages, GatewayClient, GatewayError, PageClient};
pub use options::GatewayClientOptions;
