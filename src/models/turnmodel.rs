// src/models/turnmodel.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A row exactly as the backing store returned it, before any schema mapping.
pub type RawRow = Value;

/// Unit a stored duration was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Unknown,
}

impl DurationUnit {
    pub fn to_str(&self) -> &str {
        match self {
            DurationUnit::Seconds => "seconds",
            DurationUnit::Minutes => "minutes",
            DurationUnit::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Option<DurationUnit> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "seconds" | "secs" | "s" => Some(DurationUnit::Seconds),
            "minutes" | "mins" | "m" => Some(DurationUnit::Minutes),
            "unknown" => Some(DurationUnit::Unknown),
            _ => None,
        }
    }
}

/// A duration value paired with the unit it was stored in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaggedDuration {
    pub value: f64,
    pub unit: DurationUnit,
}

impl TaggedDuration {
    pub fn seconds(value: f64) -> Self {
        Self { value, unit: DurationUnit::Seconds }
    }

    pub fn minutes(value: f64) -> Self {
        Self { value, unit: DurationUnit::Minutes }
    }

    /// Whole minutes, rounded up. `None` when the value is not a positive finite
    /// number or the unit was never pinned.
    pub fn ceil_minutes(&self) -> Option<u32> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return None;
        }

        let minutes = match self.unit {
            DurationUnit::Seconds => (self.value / 60.0).ceil(),
            DurationUnit::Minutes => self.value.ceil(),
            DurationUnit::Unknown => return None,
        };

        if minutes >= u32::MAX as f64 {
            Some(u32::MAX)
        } else {
            Some(minutes as u32)
        }
    }
}

/// Canonical ticket record, independent of the schema generation that produced it.
/// A new one is built on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTicketRecord {
    pub id: Option<String>,
    pub code: String,
    pub raw_status: Option<String>,
    pub raw_wait_duration: Option<TaggedDuration>,
    pub issued_at: Option<DateTime<Utc>>,
    pub called_at: Option<DateTime<Utc>>,
    /// Category join payload, shape unknown until resolved.
    pub category_ref: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub name: String,
    pub average_service_duration: Option<TaggedDuration>,
}

impl CategoryInfo {
    pub const DEFAULT_NAME: &'static str = "General Attention";
    pub const DEFAULT_AVERAGE_SECONDS: f64 = 900.0;
}

impl Default for CategoryInfo {
    fn default() -> Self {
        CategoryInfo {
            name: Self::DEFAULT_NAME.to_string(),
            average_service_duration: Some(TaggedDuration::seconds(Self::DEFAULT_AVERAGE_SECONDS)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Issued,
    Waiting,
    Called,
    Attended,
    Lost,
    Cancelled,
    Unknown,
}

impl TicketStatus {
    pub fn to_str(&self) -> &str {
        match self {
            TicketStatus::Issued => "issued",
            TicketStatus::Waiting => "waiting",
            TicketStatus::Called => "called",
            TicketStatus::Attended => "attended",
            TicketStatus::Lost => "lost",
            TicketStatus::Cancelled => "cancelled",
            TicketStatus::Unknown => "unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TicketStatus::Attended | TicketStatus::Lost | TicketStatus::Cancelled
        )
    }
}

/// Display urgency. Derived on every assembly, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Urgent,
    Imminent,
    Normal,
    Terminal,
    Neutral,
}

impl Tier {
    pub fn to_str(&self) -> &str {
        match self {
            Tier::Urgent => "urgent",
            Tier::Imminent => "imminent",
            Tier::Normal => "normal",
            Tier::Terminal => "terminal",
            Tier::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentTime {
    At(DateTime<Utc>),
    Unknown,
}

impl AppointmentTime {
    pub const UNKNOWN_MARKER: &'static str = "unknown";

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            AppointmentTime::At(at) => Some(*at),
            AppointmentTime::Unknown => None,
        }
    }
}

impl fmt::Display for AppointmentTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentTime::At(at) => write!(f, "{}", at.to_rfc3339()),
            AppointmentTime::Unknown => f.write_str(Self::UNKNOWN_MARKER),
        }
    }
}

impl Serialize for AppointmentTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What the rendering layer shows. Replaced wholesale each cycle, never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketViewModel {
    pub number: String,
    pub status: TicketStatus,
    pub tier: Tier,
    pub wait_minutes: u32,
    pub appointment_time: AppointmentTime,
    pub category_name: String,
    pub called_at: Option<DateTime<Utc>>,
}

impl TicketViewModel {
    /// Banner copy for the status card.
    pub fn headline(&self) -> &'static str {
        match (self.status, self.tier) {
            (TicketStatus::Called, _) => "You have been called, please come forward now.",
            (TicketStatus::Lost, _) => "Turn lost. You did not answer the call.",
            (TicketStatus::Attended, _) => "Your turn has been attended. Thank you.",
            (TicketStatus::Cancelled, _) => "This turn was cancelled.",
            (_, Tier::Imminent) => "On the waiting list, your turn is near.",
            (TicketStatus::Waiting, _) => "On the waiting list, stay alert so you arrive on time.",
            (TicketStatus::Issued, _) => "Your turn has been issued.",
            _ => "Turn status is not available right now.",
        }
    }
}
