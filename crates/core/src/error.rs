//! Error types for the LiveProof domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all LiveProof operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Protocol errors ---
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Frame errors ---
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("No frame registered for page '{0}'")]
    FrameNotRegistered(String),

    #[error("Message delivery failed to page {page}: {reason}")]
    DeliveryFailed { page: String, reason: String },

    #[error("Channel for page '{0}' is closed")]
    Closed(String),
}

/// Errors decoding inbound wire values. Per protocol contract these are
/// logged and dropped by dispatchers, never surfaced to the user.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unrecognized message type: {0}")]
    UnknownType(String),

    #[error("Message has no type discriminator")]
    MissingType,

    #[error("Malformed payload for '{message_type}': {reason}")]
    MalformedPayload {
        message_type: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No element is selected")]
    NoSelection,

    #[error("Page index {0} is out of bounds")]
    PageOutOfBounds(usize),

    #[error("Cannot delete the only remaining page")]
    LastPage,

    #[error("Invalid CSS partial: {0}")]
    InvalidCssPartial(String),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("No element with id '{0}' in this document")]
    MissingElement(String),

    #[error("Element '{0}' is not editable")]
    NotEditable(String),

    #[error("Element '{id}' was removed while waiting for styles to apply")]
    RemovedWhileWaiting { id: String },
}
