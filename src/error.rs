//! Error handling for the platewatch client

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command issued while the connection is not open
    #[error("Not connected to the video stream")]
    NotConnected,

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed inbound message
    #[error("Decode error: {0}")]
    Decode(String),

    /// Snapshot persistence call failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// Read-model query failed
    #[error("Query error: {0}")]
    Query(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
