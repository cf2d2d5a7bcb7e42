//! Error types for meshgram-node.

use meshgram_parcel::ParcelError;
use thiserror::Error;

/// Errors surfaced by the node facade.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Splitting an outgoing message failed.
    #[error(transparent)]
    Parcel(#[from] ParcelError),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
