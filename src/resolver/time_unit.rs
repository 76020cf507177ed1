//! Keep-alive time units.

use std::time::Duration;

/// Unit for a keep-alive amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

/// Accepted unit names, in ascending order of magnitude.
pub const TIME_UNITS: [(&str, TimeUnit); 7] = [
    ("nanoseconds", TimeUnit::Nanoseconds),
    ("microseconds", TimeUnit::Microseconds),
    ("milliseconds", TimeUnit::Milliseconds),
    ("seconds", TimeUnit::Seconds),
    ("minutes", TimeUnit::Minutes),
    ("hours", TimeUnit::Hours),
    ("days", TimeUnit::Days),
];

impl TimeUnit {
    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        TIME_UNITS
            .iter()
            .find(|(unit_name, _)| *unit_name == name)
            .map(|&(_, unit)| unit)
    }

    /// Comma-separated list of accepted names.
    pub fn allowed() -> String {
        TIME_UNITS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Convert `amount` of this unit to a `Duration`. `None` on overflow.
    pub fn to_duration(self, amount: u64) -> Option<Duration> {
        let secs = |mult: u64| amount.checked_mul(mult).map(Duration::from_secs);
        match self {
            TimeUnit::Nanoseconds => Some(Duration::from_nanos(amount)),
            TimeUnit::Microseconds => Some(Duration::from_micros(amount)),
            TimeUnit::Milliseconds => Some(Duration::from_millis(amount)),
            TimeUnit::Seconds => Some(Duration::from_secs(amount)),
            TimeUnit::Minutes => secs(60),
            TimeUnit::Hours => secs(3_600),
            TimeUnit::Days => secs(86_400),
        }
    }
}
