use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Deadlines that do not fit the clock are clamped to this many seconds after the epoch, roughly
/// ten thousand years.
const FAR_FUTURE_SECONDS: u64 = 10_000 * 365 * 24 * 60 * 60;

/// An absolute expiration deadline attached to a value.
///
/// Deadlines are wall-clock instants so that an `EXPIREAT` replayed from the append-only log
/// refers to the same moment regardless of when the replay happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ttl {
    deadline: SystemTime,
}

impl Ttl {
    /// A deadline `seconds` from now. Non-positive values produce a deadline that has already
    /// passed; values past the far future are clamped to it.
    pub fn from_seconds(seconds: i64) -> Self {
        let now = SystemTime::now();
        let offset = Duration::from_secs(seconds.unsigned_abs());
        let deadline = if seconds >= 0 {
            now.checked_add(offset)
                .map_or_else(far_future, |deadline| deadline.min(far_future()))
        } else {
            now.checked_sub(offset).unwrap_or(UNIX_EPOCH)
        };
        Self { deadline }
    }

    /// A deadline expressed as seconds since the Unix epoch.
    pub fn at_unix_seconds(timestamp: i64) -> Self {
        let seconds = u64::try_from(timestamp).unwrap_or(0).min(FAR_FUTURE_SECONDS);
        Self {
            deadline: UNIX_EPOCH + Duration::from_secs(seconds),
        }
    }

    pub fn deadline(&self) -> SystemTime {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.deadline
    }

    /// Whole seconds left before the deadline, truncated. Zero once expired.
    pub fn remaining_seconds(&self) -> i64 {
        self.deadline
            .duration_since(SystemTime::now())
            .map(|left| left.as_secs() as i64)
            .unwrap_or(0)
    }
}

fn far_future() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(FAR_FUTURE_SECONDS)
}

/// Current wall-clock time as seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|now| now.as_secs() as i64)
        .unwrap_or(0)
}
