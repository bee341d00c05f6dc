use std::time::Duration;

use racer::{DEFAULT_PORT, WS_PATH};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `host:port` of the game server.
    pub server: String,
    pub secure: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub reconnect_delay: Duration,
    pub reset_delay: Duration,
    pub camera_smoothing: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: format!("127.0.0.1:{}", DEFAULT_PORT),
            secure: false,
            window_width: 1280,
            window_height: 720,
            reconnect_delay: Duration::from_millis(3000),
            reset_delay: Duration::from_millis(5000),
            camera_smoothing: 0.1,
        }
    }
}

impl ClientConfig {
    pub fn endpoint(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.server, WS_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_follows_scheme() {
        let mut config = ClientConfig::default();
        assert_eq!(config.endpoint(), "ws://127.0.0.1:8080/ws");

        config.server = "race.example.com".into();
        config.secure = true;
        assert_eq!(config.endpoint(), "wss://race.example.com/ws");
    }
}
