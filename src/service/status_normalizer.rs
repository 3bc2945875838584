// service/status_normalizer.rs
use crate::models::turnmodel::{TicketStatus, Tier};

/// Waits at or under this many minutes make a waiting ticket imminent.
pub const IMMINENT_THRESHOLD_MINUTES: u32 = 30;

/// Map a raw status token onto the canonical status. Matching is exact after
/// trimming and lower-casing; anything unrecognized is `Unknown`.
pub fn canonical_status(raw_status: Option<&str>) -> TicketStatus {
    let Some(raw) = raw_status else {
        return TicketStatus::Unknown;
    };

    match raw.trim().to_lowercase().as_str() {
        "emitido" | "issued" => TicketStatus::Issued,
        "en_espera" => TicketStatus::Waiting,
        "llamado" => TicketStatus::Called,
        "atendido" => TicketStatus::Attended,
        "perdido" => TicketStatus::Lost,
        "cancelado" => TicketStatus::Cancelled,
        _ => TicketStatus::Unknown,
    }
}

/// Tier for a canonical status. Needs the resolved wait, so it must run after
/// the wait-time calculation.
pub fn tier_for(status: TicketStatus, wait_minutes: u32) -> Tier {
    match status {
        TicketStatus::Called => Tier::Urgent,
        TicketStatus::Waiting if wait_minutes <= IMMINENT_THRESHOLD_MINUTES => Tier::Imminent,
        TicketStatus::Waiting => Tier::Normal,
        TicketStatus::Attended | TicketStatus::Lost | TicketStatus::Cancelled => Tier::Terminal,
        TicketStatus::Issued | TicketStatus::Unknown => Tier::Neutral,
    }
}

pub fn normalize(raw_status: Option<&str>, wait_minutes: u32) -> (TicketStatus, Tier) {
    let status = canonical_status(raw_status);
    (status, tier_for(status, wait_minutes))
}
