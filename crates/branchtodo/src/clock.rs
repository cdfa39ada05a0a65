use chrono::{DateTime, SecondsFormat, Utc};

/// Source of the timestamps stamped onto tasks.
pub trait Clock {
    /// Current time as an ISO-8601 UTC string with millisecond precision,
    /// e.g. `2024-01-01T00:00:00.000Z`.
    fn now(&self) -> String;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        format_timestamp(Utc::now())
    }
}

/// Always returns the same instant. Useful for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock(String);

impl FixedClock {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self(timestamp.into())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}

/// Format an instant the way task timestamps are stored.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_millis_z() {
        let at = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_system_clock_shape() {
        let now = SystemClock.now();
        assert_eq!(now.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(now.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&now).is_ok());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new("2024-05-05T05:05:05.005Z");
        assert_eq!(clock.now(), "2024-05-05T05:05:05.005Z");
        assert_eq!(clock.now(), clock.now());
    }
}
