// service/wait_time.rs
use crate::models::turnmodel::TaggedDuration;

/// Used when neither the ticket nor its category carries a usable duration.
pub const DEFAULT_WAIT_MINUTES: u32 = 15;

/// Wait estimate in whole minutes.
///
/// Priority: the ticket's own wait if positive, then the category average, then
/// `DEFAULT_WAIT_MINUTES`. Conversions round up. Durations with an unpinned unit
/// are skipped.
pub fn compute_wait_minutes(
    raw_wait_duration: Option<TaggedDuration>,
    category_average: Option<TaggedDuration>,
) -> u32 {
    raw_wait_duration
        .and_then(|d| d.ceil_minutes())
        .or_else(|| category_average.and_then(|d| d.ceil_minutes()))
        .unwrap_or(DEFAULT_WAIT_MINUTES)
}
