//! Error types for exitnode.
//!
//! Only conditions that end a worker's session live here. Request-level
//! failures (DNS, connect, TLS, timeout against the target) are not
//! errors in this sense: the worker reports them to the relay as a
//! synthesized [`crate::protocol::Reply`] and keeps serving.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to connect to relay: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("control channel error: {0}")]
    Channel(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("control channel idle for {0}s")]
    IdleTimeout(u64),

    #[error("failed to encode reply: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
