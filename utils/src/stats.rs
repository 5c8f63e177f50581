//! Windowed throughput counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe counter that reports and resets per reporting window,
/// while also keeping a lifetime total.
#[derive(Default)]
pub struct WindowCounter {
    window: AtomicU64,
    total: AtomicU64,
}

impl WindowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        self.window.fetch_add(value, Ordering::Relaxed);
        self.total.fetch_add(value, Ordering::Relaxed);
    }

    /// Count accumulated since the last [`take_window`](Self::take_window).
    pub fn window(&self) -> u64 {
        self.window.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Return the window count and start a new window.
    pub fn take_window(&self) -> u64 {
        self.window.swap(0, Ordering::Relaxed)
    }

    /// Average events per second over a window of `window_secs`.
    pub fn take_rate(&self, window_secs: u64) -> f64 {
        let count = self.take_window();
        if window_secs == 0 {
            0.0
        } else {
            count as f64 / window_secs as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_resets_but_total_accumulates() {
        let c = WindowCounter::new();
        c.increment();
        c.add(4);
        assert_eq!(c.take_window(), 5);
        assert_eq!(c.window(), 0);
        c.increment();
        assert_eq!(c.total(), 6);
    }

    #[test]
    fn rate_over_window() {
        let c = WindowCounter::new();
        c.add(25);
        assert_eq!(c.take_rate(10), 2.5);
        assert_eq!(c.take_rate(10), 0.0);
        c.add(3);
        assert_eq!(c.take_rate(0), 0.0);
        assert_eq!(c.window(), 0);
    }
}
