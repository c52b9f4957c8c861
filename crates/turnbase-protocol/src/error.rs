//! Error types for the protocol layer.

/// Errors that can occur while decoding or encoding wire payloads.
///
/// A `ProtocolError` never changes game state. Rooms turn it into an
/// `Error` event addressed to the sender only.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The payload is not valid JSON, has no `Action` discriminator,
    /// names an unknown action, or has fields of the wrong shape.
    #[error("malformed action: {0}")]
    Decode(#[source] serde_json::Error),

    /// An outbound event could not be turned into JSON.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The game kind tag is not one this server knows how to build.
    #[error("unknown game kind: {0}")]
    UnknownGameKind(String),
}
