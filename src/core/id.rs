// Time-ordered 64-bit entity ids: [timestamp:48][sequence:16]
// Single-process variant of the snowflake scheme, no shard bits

use std::sync::atomic::{AtomicI64, Ordering};

const SEQUENCE_BITS: u32 = 16;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;

/// Generates unique, roughly creation-ordered ids. Sorting ids descending is
/// equivalent to sorting by creation time descending within one process.
#[derive(Debug)]
pub struct IdGenerator {
    // Packed as [last_timestamp:48][sequence:16] so one CAS covers both
    state: AtomicI64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            state: AtomicI64::new(0),
        }
    }

    /// Generate the next unique id
    pub fn next_id(&self) -> i64 {
        loop {
            let now = super::current_time_millis();
            let prev = self.state.load(Ordering::Acquire);
            let prev_ts = prev >> SEQUENCE_BITS;
            let prev_seq = prev & SEQUENCE_MASK;

            let (ts, seq) = if now > prev_ts {
                (now, 0)
            } else if prev_seq < SEQUENCE_MASK {
                (prev_ts, prev_seq + 1)
            } else {
                // Sequence exhausted within this millisecond
                std::thread::sleep(std::time::Duration::from_millis(1));
                continue;
            };

            let next = (ts << SEQUENCE_BITS) | seq;
            if self
                .state
                .compare_exchange(prev, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return next;
            }
        }
    }

    /// Millisecond timestamp embedded in an id
    pub fn extract_timestamp(id: i64) -> i64 {
        id >> SEQUENCE_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let generator = IdGenerator::new();

        let id1 = generator.next_id();
        let id2 = generator.next_id();
        let id3 = generator.next_id();

        assert!(id1 < id2);
        assert!(id2 < id3);
    }

    #[test]
    fn test_timestamp_extraction() {
        let generator = IdGenerator::new();
        let before = crate::core::current_time_millis();
        let id = generator.next_id();
        let after = crate::core::current_time_millis();

        let ts = IdGenerator::extract_timestamp(id);
        assert!(ts >= before && ts <= after);
    }
}
