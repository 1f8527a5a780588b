#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("provider error: status={status} body={body}")]
    Provider { status: u16, body: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
