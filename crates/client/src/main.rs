use std::time::Duration;

use clap::Parser;
use racer_client::{App, ClientConfig, Session, TransportEvent, WsConnector};
use winit::event_loop::EventLoop;

#[derive(Parser)]
#[command(name = "racer")]
#[command(about = "Racer game client")]
struct Args {
    #[arg(
        short,
        long,
        default_value = "127.0.0.1:8080",
        help = "Server address to connect to (host:port)"
    )]
    server: String,

    #[arg(long, help = "Connect over wss:// instead of ws://")]
    secure: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value_t = 3000, help = "Delay before reconnecting after a close")]
    reconnect_delay_ms: u64,

    #[arg(long, default_value_t = 5000, help = "Delay before a new race after a win")]
    reset_delay_ms: u64,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        ClientConfig {
            server: self.server,
            secure: self.secure,
            window_width: self.width,
            window_height: self.height,
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            ..ClientConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    log::info!("Server endpoint: {}", config.endpoint());

    let runtime = tokio::runtime::Runtime::new()?;

    let event_loop = EventLoop::<TransportEvent>::with_user_event().build()?;
    let connector = WsConnector::new(runtime.handle().clone(), event_loop.create_proxy());
    let session = Session::new(config, connector);

    let mut app = App::new(session, runtime.handle().clone());
    event_loop.run_app(&mut app)?;

    drop(app);
    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}
