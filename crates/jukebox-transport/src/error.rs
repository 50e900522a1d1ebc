/// Errors raised while accepting, reading from or writing to a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound to the requested address.
    #[error("bind to {addr} failed: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a TCP stream failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The peer did not speak a valid WebSocket handshake.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The peer did not finish the handshake in time.
    #[error("handshake did not complete within {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// Writing a frame to the peer failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame from the peer failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The peer already went away.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}
