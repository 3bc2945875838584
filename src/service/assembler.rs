// service/assembler.rs
use chrono::Duration;

use crate::{
    models::turnmodel::{AppointmentTime, RawTicketRecord, TicketViewModel},
    service::{
        category_resolver::resolve_category,
        status_normalizer::normalize,
        wait_time::compute_wait_minutes,
    },
};

/// Build the view model for one record. Pure: same record, same view model.
///
/// Order matters: category, then wait minutes, then status, because the waiting
/// tier depends on the resolved wait.
pub fn assemble(record: &RawTicketRecord) -> TicketViewModel {
    let category = resolve_category(&record.category_ref);

    let wait_minutes =
        compute_wait_minutes(record.raw_wait_duration, category.average_service_duration);

    let (status, tier) = normalize(record.raw_status.as_deref(), wait_minutes);

    let appointment_time = match record.issued_at {
        Some(issued_at) => issued_at
            .checked_add_signed(Duration::minutes(i64::from(wait_minutes)))
            .map(AppointmentTime::At)
            .unwrap_or(AppointmentTime::Unknown),
        None => AppointmentTime::Unknown,
    };

    TicketViewModel {
        number: record.code.clone(),
        status,
        tier,
        wait_minutes,
        appointment_time,
        category_name: category.name,
        called_at: record.called_at,
    }
}
