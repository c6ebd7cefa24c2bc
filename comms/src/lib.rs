/// The contract every chat client backend fulfils for the command loop
pub mod client;
/// Errors surfaced by chat client operations
pub mod error;
/// Timeline events and the notifications a client publishes to its subscribers
pub mod event;
/// Snapshots of rooms and their members as seen by the client
pub mod room;
/// [client::ChatClient] implementation backed by `matrix-sdk`.
/// Requires the 'matrix' feature to be enabled and will bring in the SDK alongside with a tokio runtime
#[cfg(feature = "matrix")]
pub mod matrix;

pub use client::{ChatClient, ClientConfig};
pub use error::ClientError;
pub use event::{ClientEvent, SendStatus, TimelineEvent};
pub use room::{Membership, Room, RoomMember};
