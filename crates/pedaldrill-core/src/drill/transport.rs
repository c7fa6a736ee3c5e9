//! Session clock.
//!
//! The transport is the single source of "now" in session seconds. It does
//! not read the wall clock: the host drives it with explicit deltas from
//! its display-refresh or timer callback, which keeps replays exact.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Fixed tick cadence used by hosts that do not measure their own deltas.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

fn default_tick_hz() -> u32 {
    60
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
        }
    }
}

impl TransportConfig {
    pub fn tick_secs(&self) -> f64 {
        1.0 / f64::from(self.tick_hz.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    elapsed_secs: f64,
    running: bool,
    paused: bool,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed_secs
    }

    /// Running and not paused.
    pub fn is_advancing(&self) -> bool {
        self.running && !self.paused
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn start(&mut self) {
        self.running = true;
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance by `dt` seconds when advancing; returns the new elapsed time.
    /// Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if self.is_advancing() && dt.is_finite() && dt > 0.0 {
            self.elapsed_secs += dt;
        }
        self.elapsed_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_transport_does_not_advance() {
        let mut transport = Transport::new();
        assert_eq!(transport.advance(0.5), 0.0);
        transport.start();
        assert_eq!(transport.advance(0.5), 0.5);
    }

    #[test]
    fn pause_and_resume() {
        let mut transport = Transport::new();
        transport.start();
        transport.advance(1.0);
        transport.pause();
        assert!(transport.is_paused());
        assert_eq!(transport.advance(1.0), 1.0);
        transport.resume();
        assert_eq!(transport.advance(1.0), 2.0);
    }

    #[test]
    fn ignores_bad_deltas() {
        let mut transport = Transport::new();
        transport.start();
        transport.advance(-1.0);
        transport.advance(f64::NAN);
        assert_eq!(transport.elapsed(), 0.0);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut transport = Transport::new();
        transport.start();
        transport.advance(3.0);
        transport.reset();
        assert_eq!(transport.elapsed(), 0.0);
        assert!(!transport.is_running());
    }

    #[test]
    fn tick_secs_from_hz() {
        let cfg = TransportConfig { tick_hz: 50 };
        assert!((cfg.tick_secs() - 0.02).abs() < 1e-12);
        let cfg = TransportConfig { tick_hz: 0 };
        assert_eq!(cfg.tick_secs(), 1.0);
    }
}
