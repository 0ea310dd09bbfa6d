use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

/// Calendar day used as the `created>` lower bound of a search window.
/// Renders and parses as `YYYY-MM-DD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(pub Date);

impl Day {
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    /// The UTC day `days` days before `now`.
    pub fn days_before(now: OffsetDateTime, days: u32) -> Self {
        let then = now.checked_sub(Duration::days(i64::from(days))).unwrap_or(now);
        Self(then.date())
    }

    /// Lower bound for a window of `days` days ending today (UTC).
    pub fn lookback(days: u32) -> Self {
        Self::days_before(OffsetDateTime::now_utc(), days)
    }

    pub fn date(self) -> Date {
        self.0
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), u8::from(self.0.month()), self.0.day())
    }
}

impl FromStr for Day {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fmt = format_description!("[year]-[month]-[day]");
        Date::parse(s.trim(), &fmt)
            .map(Day)
            .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
    }
}
