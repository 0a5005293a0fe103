// Shared admission gate spacing out outbound request starts

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Single ticking token source shared by every task of one resolution call.
///
/// Each `wait_turn` consumes one tick, so successive task starts are at least
/// `period` apart. It throttles start times only, not how many tasks run.
pub struct RateGate {
    ticker: Mutex<Interval>,
}

impl RateGate {
    /// The first tick fires one `period` after construction
    pub fn new(period: Duration) -> Self {
        // tokio rejects a zero period
        let period = period.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker: Mutex::new(ticker),
        }
    }

    /// Wait for the next free time slot
    pub async fn wait_turn(&self) {
        let mut ticker = self.ticker.lock().await;
        ticker.tick().await;
    }
}
