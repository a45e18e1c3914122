//! Request Gateway abstraction.
//!
//! Adapters never talk HTTP themselves. They hand a provider-relative path,
//! query parameters and a method to a [`RequestGateway`] and receive the
//! parsed JSON body back. [`HttpGateway`] is the production implementation;
//! tests use `mock::MockGateway`.

mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpGateway;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::CoreError;

/// Ordered query parameters; ordering keeps request logs and URLs stable.
pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
        }
    }
}

/// Transport to a single provider base URL.
///
/// Implementations own authentication headers, connection pooling, timeouts
/// and JSON decoding. Errors are returned as [`CoreError::Gateway`] and are
/// propagated by adapters unchanged.
#[async_trait]
pub trait RequestGateway: Send + Sync {
    async fn request(
        &self,
        path: &str,
        query: &QueryParams,
        method: Method,
    ) -> Result<serde_json::Value, CoreError>;
}
