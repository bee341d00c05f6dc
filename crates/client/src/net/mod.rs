mod config;
pub mod connection;
pub mod ws;

pub use config::ClientConfig;

pub use connection::{
    Attempt, ConnectionManager, ConnectionState, Connector, Link, TransportEvent,
    TransportEventKind,
};
pub use ws::{EventSink, WsConnector, WsLink};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection is closed")]
    Closed,
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
