use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CoreError, GatewayError};

use super::{Method, QueryParams, RequestGateway};

/// One call observed by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub path: String,
    pub query: QueryParams,
    pub method: Method,
}

enum Reply {
    Json(serde_json::Value),
    HttpStatus(u16),
}

struct Route {
    path: String,
    query: Option<(String, String)>,
    reply: Reply,
}

/// A mock gateway for testing. Returns canned JSON bodies keyed by path and
/// an optional query constraint, and records every call it receives.
pub struct MockGateway {
    routes: Vec<Route>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGateway {
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder { routes: Vec::new() }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock call log poisoned").len()
    }
}

pub struct MockGatewayBuilder {
    routes: Vec<Route>,
}

impl MockGatewayBuilder {
    pub fn with_response(mut self, path: &str, body: serde_json::Value) -> Self {
        self.routes.push(Route {
            path: path.to_owned(),
            query: None,
            reply: Reply::Json(body),
        });
        self
    }

    /// Respond only when the query parameter `key` equals `value`.
    /// Query-constrained routes take precedence over plain ones.
    pub fn with_query_response(
        mut self,
        path: &str,
        key: &str,
        value: &str,
        body: serde_json::Value,
    ) -> Self {
        self.routes.push(Route {
            path: path.to_owned(),
            query: Some((key.to_owned(), value.to_owned())),
            reply: Reply::Json(body),
        });
        self
    }

    pub fn with_http_error(mut self, path: &str, status: u16) -> Self {
        self.routes.push(Route {
            path: path.to_owned(),
            query: None,
            reply: Reply::HttpStatus(status),
        });
        self
    }

    pub fn build(self) -> MockGateway {
        MockGateway {
            routes: self.routes,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RequestGateway for MockGateway {
    async fn request(
        &self,
        path: &str,
        query: &QueryParams,
        method: Method,
    ) -> Result<serde_json::Value, CoreError> {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push(RecordedCall {
                path: path.to_owned(),
                query: query.clone(),
                method,
            });

        let constrained = self.routes.iter().find(|route| {
            route.path == path
                && route
                    .query
                    .as_ref()
                    .is_some_and(|(k, v)| query.get(k) == Some(v))
        });
        let route = constrained
            .or_else(|| {
                self.routes
                    .iter()
                    .find(|route| route.path == path && route.query.is_none())
            })
            .ok_or_else(|| GatewayError::HttpStatus {
                status: 404,
                body: format!("no mock route for `{path}`"),
            })?;

        match &route.reply {
            Reply::Json(body) => Ok(body.clone()),
            Reply::HttpStatus(status) => Err(GatewayError::HttpStatus {
                status: *status,
                body: String::new(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn query_constrained_route_wins_over_plain_route() {
        let gateway = MockGateway::builder()
            .with_response("outputs", json!({ "page": "default" }))
            .with_query_response("outputs", "offset", "50", json!({ "page": "second" }))
            .build();

        let mut query = QueryParams::new();
        query.insert("offset".into(), "50".into());
        let body = gateway
            .request("outputs", &query, Method::Get)
            .await
            .unwrap();
        assert_eq!(body["page"], "second");

        query.insert("offset".into(), "0".into());
        let body = gateway
            .request("outputs", &query, Method::Get)
            .await
            .unwrap();
        assert_eq!(body["page"], "default");
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn unknown_path_is_a_gateway_error() {
        let gateway = MockGateway::builder().build();
        let err = gateway
            .request("missing", &QueryParams::new(), Method::Get)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Gateway(GatewayError::HttpStatus { status: 404, .. })
        ));
    }
}
