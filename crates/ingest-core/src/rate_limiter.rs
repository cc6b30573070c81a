//! Frame-rate limiting for snapshot consumers.
//!
//! Snapshots arriving sooner than the configured interval after the last
//! accepted one are dropped. Nothing is queued or retried.

use std::time::{Duration, Instant};

use serde::Serialize;

pub struct RateLimiter {
    max_rate_hz: u32,
    min_interval: Duration,
    last_processed: Option<Instant>,
    dropped_count: u64,
    processed_count: u64,
}

impl RateLimiter {
    /// Create a new rate limiter with maximum rate in Hz.
    pub fn new(max_rate_hz: u32) -> Self {
        let max_rate_hz = max_rate_hz.max(1);
        Self {
            max_rate_hz,
            min_interval: interval_for(max_rate_hz),
            last_processed: None,
            dropped_count: 0,
            processed_count: 0,
        }
    }

    pub fn should_process(&mut self) -> bool {
        self.should_process_at(Instant::now())
    }

    /// Decide for a snapshot arriving at `now`.
    pub fn should_process_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_processed {
            if now.saturating_duration_since(last) < self.min_interval {
                self.dropped_count += 1;
                return false;
            }
        }

        self.last_processed = Some(now);
        self.processed_count += 1;
        true
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    pub fn processed_count(&self) -> u64 {
        self.processed_count
    }

    pub fn drop_rate_percent(&self) -> f32 {
        let total = self.dropped_count + self.processed_count;
        if total == 0 {
            0.0
        } else {
            (self.dropped_count as f32 / total as f32) * 100.0
        }
    }

    pub fn max_rate_hz(&self) -> u32 {
        self.max_rate_hz
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats::from(self)
    }
}

fn interval_for(rate_hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / rate_hz as u64)
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    pub max_rate_hz: u32,
    pub processed_count: u64,
    pub dropped_count: u64,
    pub drop_rate_percent: f32,
}

impl From<&RateLimiter> for RateLimiterStats {
    fn from(limiter: &RateLimiter) -> Self {
        Self {
            max_rate_hz: limiter.max_rate_hz,
            processed_count: limiter.processed_count,
            dropped_count: limiter.dropped_count,
            drop_rate_percent: limiter.drop_rate_percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(60);
        assert_eq!(limiter.max_rate_hz(), 60);
        assert_eq!(limiter.min_interval(), Duration::from_nanos(16_666_666));
        assert_eq!(limiter.processed_count(), 0);
        assert_eq!(limiter.dropped_count(), 0);
    }

    #[test]
    fn test_zero_rate_clamped() {
        let limiter = RateLimiter::new(0);
        assert_eq!(limiter.max_rate_hz(), 1);
        assert_eq!(limiter.min_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_drops_newest_when_too_soon() {
        let mut limiter = RateLimiter::new(60);
        let t0 = Instant::now();

        assert!(limiter.should_process_at(t0));
        assert!(!limiter.should_process_at(t0 + Duration::from_millis(5)));
        assert!(!limiter.should_process_at(t0 + Duration::from_millis(16)));
        // measured from the last accepted frame, not the last dropped one
        assert!(limiter.should_process_at(t0 + Duration::from_millis(17)));

        assert_eq!(limiter.processed_count(), 2);
        assert_eq!(limiter.dropped_count(), 2);
        assert!((limiter.drop_rate_percent() - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sixty_hz_cap_over_one_second_of_120hz_input() {
        let mut limiter = RateLimiter::new(60);
        let t0 = Instant::now();
        let step = Duration::from_nanos(1_000_000_000 / 120);
        let accepted = (0..120u32)
            .filter(|i| limiter.should_process_at(t0 + step * *i))
            .count();
        assert_eq!(accepted, 60);
        let stats = limiter.stats();
        assert_eq!(stats.processed_count, 60);
        assert_eq!(stats.dropped_count, 60);
    }
}
