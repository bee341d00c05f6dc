pub mod app;
pub mod debug;
pub mod game;
pub mod net;
pub mod render;
pub mod session;
pub mod timer;

pub use app::App;
pub use net::{ClientConfig, TransportEvent, WsConnector};
pub use session::{Session, Task};
