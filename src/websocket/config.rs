//! `RealWebSocket` session configuration, a builder adapted from the
//! teacher's `websocket::Config` (ping interval / inactivity timeout /
//! max packet size) plus the queueing and deflate knobs §4.6 adds.

use std::sync::Arc;
use std::time::Duration;

/// Bytes a single outgoing queue (pongs, or messages+close) may hold
/// before a queue overflow forces a client-going-away close (§4.6
/// "Session queues").
pub const MAX_QUEUE_SIZE: usize = 16 << 20;

#[derive(Debug, Clone)]
pub struct Config {
    ping_interval: Duration,
    inactivity_timeout: Duration,
    max_packet_size: usize,
    cancel_after_close: Duration,
    minimum_deflate_size: usize,
}

impl Config {
    /// Create a config with defaults: 10s ping interval, 30s inactivity
    /// timeout, 10MiB max packet, 60s cancel-after-close, and a 1024-byte
    /// deflate threshold (§4.6 "Writer" — "RSV1 is set ... if payload size
    /// >= minimumDeflateSize").
    pub fn new() -> Config {
        Config {
            ping_interval: Duration::from_secs(10),
            inactivity_timeout: Duration::from_secs(30),
            max_packet_size: 10 << 20,
            cancel_after_close: Duration::from_secs(60),
            minimum_deflate_size: 1024,
        }
    }

    pub fn ping_interval(&mut self, dur: Duration) -> &mut Self {
        self.ping_interval = dur;
        self
    }

    pub fn inactivity_timeout(&mut self, dur: Duration) -> &mut Self {
        self.inactivity_timeout = dur;
        self
    }

    pub fn max_packet_size(&mut self, size: usize) -> &mut Self {
        self.max_packet_size = size;
        self
    }

    pub fn cancel_after_close(&mut self, dur: Duration) -> &mut Self {
        self.cancel_after_close = dur;
        self
    }

    pub fn minimum_deflate_size(&mut self, size: usize) -> &mut Self {
        self.minimum_deflate_size = size;
        self
    }

    pub fn get_ping_interval(&self) -> Duration {
        self.ping_interval
    }

    pub fn get_inactivity_timeout(&self) -> Duration {
        self.inactivity_timeout
    }

    pub fn get_max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    pub fn get_cancel_after_close(&self) -> Duration {
        self.cancel_after_close
    }

    pub fn get_minimum_deflate_size(&self) -> usize {
        self.minimum_deflate_size
    }

    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::new();
        assert_eq!(cfg.get_ping_interval(), Duration::from_secs(10));
        assert_eq!(cfg.get_cancel_after_close(), Duration::from_secs(60));
        assert_eq!(cfg.get_minimum_deflate_size(), 1024);
    }

    #[test]
    fn builder_overrides_stick() {
        let mut builder = Config::new();
        let cfg = builder.ping_interval(Duration::from_secs(5)).max_packet_size(4096).done();
        assert_eq!(cfg.get_ping_interval(), Duration::from_secs(5));
        assert_eq!(cfg.get_max_packet_size(), 4096);
    }
}
