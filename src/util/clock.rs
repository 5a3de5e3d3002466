//! Time helpers shared by the queue and pool counters.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

/// Average of `total` over `count` samples, in fractional milliseconds.
///
/// Returns `0.0` when nothing has been sampled yet.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_ms(total: Duration, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total.as_secs_f64() * 1000.0 / count as f64
}
