//! Trailing-edge debouncing with an explicit clock.
//!
//! Nothing here spawns timers. The owner calls [`Debouncer::call`] when a
//! value changes and [`Debouncer::poll`] from whatever tick it already has;
//! a value comes out once the delay has passed with no newer call.

use std::time::{Duration, Instant};

/// Holds the most recent value until `delay` has passed without another call.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record `value`, superseding any pending one and restarting the window.
    pub fn call(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Take the pending value if its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Take the pending value regardless of the window.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Drop the pending value without delivering it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending value is due.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, at)| self.delay.saturating_sub(now.saturating_duration_since(*at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.call(1, start);

        assert_eq!(d.poll(start + Duration::from_millis(50)), None);
        assert!(d.is_pending());
        assert_eq!(d.poll(start + Duration::from_millis(100)), Some(1));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + Duration::from_millis(200)), None);
    }

    #[test]
    fn test_only_last_call_fires() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.call(1, start);
        d.call(2, start + Duration::from_millis(60));
        d.call(3, start + Duration::from_millis(120));

        // window restarts on each call
        assert_eq!(d.poll(start + Duration::from_millis(200)), None);
        assert_eq!(d.poll(start + Duration::from_millis(220)), Some(3));
        assert_eq!(d.poll(start + Duration::from_millis(400)), None);
    }

    #[test]
    fn test_flush_and_cancel() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(500));
        d.call("a", start);
        assert_eq!(d.remaining(start + Duration::from_millis(200)), Some(Duration::from_millis(300)));
        assert_eq!(d.flush(), Some("a"));
        assert_eq!(d.flush(), None);

        d.call("b", start);
        d.cancel();
        assert_eq!(d.poll(start + Duration::from_secs(1)), None);
    }
}
