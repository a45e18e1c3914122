use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{header, Url};
use tracing::{debug, trace};

use crate::error::{CoreError, GatewayError};

use super::{Method, QueryParams, RequestGateway};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// JSON-over-HTTP(S) gateway to one provider base URL.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    limiter: Option<DirectRateLimiter>,
}

impl HttpGateway {
    /// Create a gateway rooted at `base_url`.
    ///
    /// If `requests_per_second` is set, outbound calls are additionally
    /// throttled at the transport level. This is independent of any fixed
    /// pacing an adapter applies on its own.
    pub fn new(base_url: &str, requests_per_second: Option<u32>) -> Result<Self, CoreError> {
        let base_url = parse_base_url(base_url)?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::InvalidConfig(format!("build HTTP client: {e}")))?;

        let limiter = match requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::InvalidConfig("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            base_url,
            limiter,
        })
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn request(
        &self,
        path: &str,
        query: &QueryParams,
        method: Method,
    ) -> Result<serde_json::Value, CoreError> {
        self.wait_for_rate_limit().await;
        let url = self.url_for(path);
        debug!(http.method = %method, http.path = path, http.params = query.len(), "gateway request");

        let builder = match method {
            Method::Get => self.client.get(&url).query(query),
            Method::Post => self
                .client
                .post(&url)
                .header(header::CONTENT_TYPE, "application/json")
                .json(query),
        };

        let response = builder.send().await.map_err(GatewayError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(GatewayError::Transport)?;
        debug!(http.path = path, %status, body_len = body.len(), "gateway response");
        trace!(http.path = path, body = %body, "gateway response body");

        if !status.is_success() {
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        serde_json::from_str(&body).map_err(|e| {
            GatewayError::InvalidResponse(format!("decode JSON response: {e}; body={body}")).into()
        })
    }
}

fn parse_base_url(base_url: &str) -> Result<String, CoreError> {
    let parsed = Url::parse(base_url).map_err(|e| {
        CoreError::InvalidConfig(format!(
            "invalid base url `{base_url}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(base_url.trim_end_matches('/').to_owned()),
        other => Err(CoreError::InvalidConfig(format!(
            "unsupported base url scheme `{other}`; expected http or https"
        ))),
    }
}
