use thiserror::Error;

/// Errors that can occur while talking to the chat backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The credentials or homeserver address could not be used to build a client.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// The room is not known to the client.
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    /// The event has no local echo that could be (re)sent.
    #[error("no local event {transaction_id} in room {room_id}")]
    UnknownEvent {
        room_id: String,
        transaction_id: String,
    },

    /// The backend rejected or failed the request. Carries the raw error text.
    #[error("{0}")]
    Sdk(String),
}

impl ClientError {
    pub fn sdk(err: impl std::fmt::Display) -> Self {
        Self::Sdk(err.to_string())
    }
}
