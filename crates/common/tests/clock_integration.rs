//! Integration tests for the clock abstraction used by retry loops.

use std::sync::Arc;
use std::time::Duration;

use bulkload_common::{Clock, MockClock, SystemClock};

async fn wait_between_attempts(clock: &dyn Clock, attempts: u32, wait: Duration) -> Duration {
    let start = clock.now();
    for _ in 1..attempts {
        clock.sleep(wait).await;
    }
    clock.now().duration_since(start)
}

#[tokio::test]
async fn mock_clock_counts_waits_through_trait_object() {
    let clock = MockClock::new();

    let elapsed = wait_between_attempts(&clock, 4, Duration::from_secs(10)).await;

    assert_eq!(elapsed, Duration::from_secs(30));
    assert_eq!(clock.sleep_count(), 3);
}

#[tokio::test]
async fn arc_wrapped_clocks_are_clocks() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let elapsed = wait_between_attempts(&clock, 2, Duration::from_millis(1)).await;

    assert!(elapsed >= Duration::from_millis(1));
}
