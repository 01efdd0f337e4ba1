use std::time::Duration;

/// Capture session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Network interface to capture from
    pub interface: String,

    /// Number of reported frames after which the session ends
    pub max_count: u64,

    /// Enable promiscuous mode
    pub promiscuous: bool,

    /// Bytes captured per frame
    pub snaplen: i32,

    /// Device read timeout; bounds how long the delivery path takes to notice a stop
    pub read_timeout_ms: i32,

    /// Control loop tick
    pub poll_interval: Duration,
}

impl SessionConfig {
    /// Configuration with defaults for everything but the interface
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            max_count: 1,
            promiscuous: false,
            snaplen: 65535,
            read_timeout_ms: 100,
            poll_interval: Duration::from_millis(10),
        }
    }
}
