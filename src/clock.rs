use chrono::{DateTime, NaiveDate, Utc};

/// Wall-clock source for the simulation. Milliseconds since the Unix epoch.
pub(crate) trait Clock {
    fn now_ms(&self) -> i64;

    /// Calendar date of `now_ms`, in UTC.
    fn today(&self) -> NaiveDate {
        date_of(self.now_ms())
    }
}

pub(crate) fn date_of(ms: i64) -> NaiveDate {
    DateTime::from_timestamp_millis(ms).map_or(NaiveDate::MIN, |dt| dt.date_naive())
}

pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
pub(crate) struct ManualClock {
    now: std::cell::Cell<i64>,
}

#[cfg(test)]
impl ManualClock {
    /// 2024-03-10 12:00:00 UTC
    pub(crate) const NOON: i64 = 1_710_072_000_000;

    pub(crate) fn at(ms: i64) -> Self {
        Self {
            now: std::cell::Cell::new(ms),
        }
    }

    pub(crate) fn advance_ms(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }

    pub(crate) fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs * 1000);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}
