use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// 2025-01-01T00:00:00Z
const EPOCH_MS: u64 = 1_735_689_600_000;
const SEQUENCE_BITS: u32 = 12;

/// Last id handed out; every new id is strictly greater.
static LAST: AtomicU64 = AtomicU64::new(0);

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(EPOCH_MS)
        .saturating_sub(EPOCH_MS)
}

/// Time-ordered unique id: 12 low bits of per-millisecond sequence under the
/// millisecond timestamp. Sorting ids as numbers sorts by creation time.
pub fn generate() -> String {
    let candidate = now_ms() << SEQUENCE_BITS;
    let mut last = LAST.load(Ordering::Relaxed);
    loop {
        // Same (or a skewed-back) millisecond: bump past the previous id.
        let next = candidate.max(last + 1);
        match LAST.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Unix milliseconds an id was minted at.
pub fn timestamp_of(id: &str) -> Option<u64> {
    let num: u64 = id.parse().ok()?;
    Some((num >> SEQUENCE_BITS) + EPOCH_MS)
}
