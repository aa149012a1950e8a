use chrono::{DateTime, Utc};

/// Source of timestamps for entities, audit entries and backups.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that advances one second on every reading.
    #[derive(Debug, Default)]
    pub(crate) struct StepClock {
        ticks: AtomicI64,
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
            Utc.with_ymd_and_hms(2024, 8, 5, 9, 0, 0).unwrap() + Duration::seconds(tick)
        }
    }
}
