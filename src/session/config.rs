use std::time::Duration;

/// Configuration for the recording controller
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period of the elapsed-time display refresh
    /// Default: 1 second
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}
