pub mod input;
pub mod protocol;
pub mod snapshot;

pub use input::{InputFlags, InputState};
pub use protocol::{ClientMessage, ConnectedInfo, ProtocolError, ServerMessage};
pub use snapshot::{Checkpoint, Player, PlayerId, Snapshot};

/// Path of the WebSocket endpoint on the game host.
pub const WS_PATH: &str = "/ws";
pub const DEFAULT_PORT: u16 = 8080;
