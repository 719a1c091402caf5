use thiserror::Error;

/// Errors that can occur when publishing or receiving events.
#[derive(Debug, Error)]
pub enum BusError {
    /// The event body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport failed to publish or acknowledge a message.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The publishing handle could not be created.
    #[error("Producer initialization failed: {0}")]
    ProducerInit(String),

    /// The subscriber could not be created or failed while receiving.
    #[error("Receive error: {0}")]
    Receive(String),

    /// Outstanding messages were not confirmed before the flush deadline.
    #[error("Flush timed out with {remaining} message(s) still in flight")]
    FlushTimeout { remaining: usize },

    /// The delivery report listener terminated abnormally.
    #[error("Delivery report listener failed: {0}")]
    Listener(String),
}

/// Result type for event bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
