//! Search query builder. Renders the space-joined conjunction understood by the
//! search endpoint, e.g. `created>2024-05-01 status:open type:ticket`.

use crate::date::Day;
use crate::ticket::Status;
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub created_after: Option<Day>,
    pub status: Option<Status>,
}

impl SearchQuery {
    /// Query over tickets only; other result types are excluded server-side.
    pub fn tickets() -> Self {
        Self::default()
    }

    pub fn created_after(mut self, day: Day) -> Self { self.created_after = Some(day); self }
    pub fn status(mut self, status: Status) -> Self { self.status = Some(status); self }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(day) = self.created_after {
            write!(f, "created>{} ", day)?;
        }
        if let Some(status) = self.status {
            write!(f, "status:{} ", status)?;
        }
        f.write_str("type:ticket")
    }
}
