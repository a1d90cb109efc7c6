// src/pipeline/watch.rs

//! Fixed-interval scheduling of crawl cycles.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};

use crate::pipeline::scan::Scanner;
use crate::utils::log;

/// Run cycles on a fixed interval.
///
/// The first cycle starts immediately. A cycle that overruns the interval
/// delays the next tick instead of stacking one behind it. Errors are logged
/// and the loop carries on. Returns the number of cycles run once
/// `max_cycles` is reached; without a limit it never returns.
pub async fn watch(scanner: &mut Scanner, period: Duration, max_cycles: Option<usize>) -> usize {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycles = 0;
    while max_cycles.is_none_or(|max| cycles < max) {
        ticker.tick().await;
        cycles += 1;

        match scanner.run().await {
            Ok(outcome) => log::summary(&format!("Cycle {cycles}"), &outcome.summary_items()),
            Err(e) => ::log::error!("Cycle {} failed: {}", cycles, e),
        }
    }

    cycles
}
