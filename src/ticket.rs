//! Ticket model as returned by the search endpoint, plus the status partition key.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Ticket lifecycle status. Each status is one partition of a collection cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    New,
    Open,
    Pending,
    Solved,
    Closed,
}

impl Status {
    /// Statuses that are searched per partition. `Closed` is count-only.
    pub const ACTIVE: [Status; 4] = [Status::New, Status::Open, Status::Pending, Status::Solved];

    pub const ALL: [Status; 5] = [Status::New, Status::Open, Status::Pending, Status::Solved, Status::Closed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::New => "new",
            Status::Open => "open",
            Status::Pending => "pending",
            Status::Solved => "solved",
            Status::Closed => "closed",
        }
    }

    pub fn is_searchable(self) -> bool {
        self != Status::Closed
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Status::New),
            "open" => Ok(Status::Open),
            "pending" => Ok(Status::Pending),
            "solved" => Ok(Status::Solved),
            "closed" => Ok(Status::Closed),
            other => Err(format!("unknown ticket status: {other:?}")),
        }
    }
}

/// Read-only view of a ticket. Only the fields used for aggregation are decoded;
/// everything else in the payload is ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, rename = "type")]
    pub ticket_type: Option<String>,
    #[serde(default)]
    pub via: Option<Via>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub custom_fields: Vec<CustomField>,
}

/// A list that may come back as `null`; null decodes as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Via {
    #[serde(default)]
    pub channel: Option<String>,
}

/// One `(field-id, value)` pair. The value is untyped: null, string, number,
/// bool, or a list for multi-select fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub value: Value,
}

impl Ticket {
    /// `via.channel`, if present and non-empty.
    pub fn channel(&self) -> Option<&str> {
        self.via
            .as_ref()
            .and_then(|v| v.channel.as_deref())
            .filter(|c| !c.is_empty())
    }

    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref().filter(|p| !p.is_empty())
    }

    pub fn ticket_type(&self) -> Option<&str> {
        self.ticket_type.as_deref().filter(|t| !t.is_empty())
    }
}
