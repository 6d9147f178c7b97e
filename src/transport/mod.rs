//! Transport contract and its HTTP implementation.

mod http;

pub use http::HttpTransport;

use crate::protocol::{RawResponse, Request, TransportError};

/// Performs one request/response round trip.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw reply.
    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;
}
