/// Failures raised by a [`RequestGateway`](crate::gateway::RequestGateway)
/// implementation. Adapters propagate these unchanged.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider replied with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{provider} `{command}` request unsuccessful, status: {status}")]
    ProviderStatus {
        provider: &'static str,
        command: String,
        status: String,
    },

    #[error("{provider} does not support `{operation}`")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },

    #[error("invalid provider data: {0}")]
    InvalidResponse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
