use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("at most {max_calls} call(s) per {}s allowed; retry in {}s", .period.as_secs(), .retry_after.as_secs())]
pub struct RateLimitExceeded {
    pub max_calls: u32,
    pub period: Duration,
    pub retry_after: Duration,
}

/// Fixed-window call limiter.
///
/// A window opens at the first accepted call and lasts `period`; up to
/// `max_calls` calls are accepted inside it.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_calls: u32,
    period: Duration,
    window_start: Option<Instant>,
    calls: u32,
}

impl RateLimiter {
    pub fn new(max_calls: u32, period: Duration) -> Self {
        RateLimiter {
            max_calls: max_calls.max(1),
            period,
            window_start: None,
            calls: 0,
        }
    }

    pub fn try_acquire(&mut self) -> Result<(), RateLimitExceeded> {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> Result<(), RateLimitExceeded> {
        match self.window_start {
            Some(start) if now.saturating_duration_since(start) < self.period => {
                if self.calls < self.max_calls {
                    self.calls += 1;
                    Ok(())
                } else {
                    Err(RateLimitExceeded {
                        max_calls: self.max_calls,
                        period: self.period,
                        retry_after: self.period - now.saturating_duration_since(start),
                    })
                }
            }
            _ => {
                self.window_start = Some(now);
                self.calls = 1;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_inside_window_is_rejected() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.try_acquire_at(t0).is_ok());
        let err = limiter
            .try_acquire_at(t0 + Duration::from_secs(20))
            .unwrap_err();
        assert_eq!(err.retry_after, Duration::from_secs(40));
        assert_eq!(err.max_calls, 1);
    }

    #[test]
    fn window_reopens_after_period() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.try_acquire_at(t0).is_ok());
        assert!(limiter.try_acquire_at(t0 + Duration::from_secs(60)).is_ok());
        assert!(limiter.try_acquire_at(t0 + Duration::from_secs(61)).is_err());
    }

    #[test]
    fn several_calls_per_window() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(10));
        let t0 = Instant::now();

        for i in 0..3 {
            assert!(limiter.try_acquire_at(t0 + Duration::from_secs(i)).is_ok());
        }
        assert!(limiter.try_acquire_at(t0 + Duration::from_secs(5)).is_err());
    }
}
