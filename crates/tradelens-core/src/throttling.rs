use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side request budget for an upstream quota.
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
}

impl Throttle {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
            clock: DefaultClock::default(),
        }
    }

    pub fn per_minute(quota_limit: u32) -> Self {
        Self::new(Duration::from_secs(60), quota_limit)
    }

    /// Takes one unit of budget, or reports how long until one frees up.
    pub fn acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_once_burst_is_spent() {
        let throttle = Throttle::per_minute(2);

        assert!(throttle.acquire().is_ok());
        assert!(throttle.acquire().is_ok());

        let wait = throttle.acquire().expect_err("third call should be throttled");
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(30));
    }
}
