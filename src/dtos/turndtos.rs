// dtos/turndtos.rs
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::turnmodel::{AppointmentTime, TicketStatus, TicketViewModel, Tier};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct TicketCodeDto {
    #[validate(length(min = 1, message = "Ticket code is required"))]
    pub code: String,
}

impl TicketCodeDto {
    pub fn new(raw: &str) -> Self {
        TicketCodeDto {
            code: raw.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterTurnDto {
    pub number: String,
    pub status: TicketStatus,
    pub tier: Tier,
    pub headline: String,
    pub wait_minutes: u32,
    pub appointment_time: String,
    /// Wall-clock `HH:MM` of the appointment in the display offset.
    pub appointment_clock: Option<String>,
    pub category_name: String,
    pub called_at: Option<DateTime<Utc>>,
}

impl FilterTurnDto {
    pub fn filter_turn(view: &TicketViewModel, display_offset: &FixedOffset) -> Self {
        FilterTurnDto {
            number: view.number.to_owned(),
            status: view.status,
            tier: view.tier,
            headline: view.headline().to_string(),
            wait_minutes: view.wait_minutes,
            appointment_time: view.appointment_time.to_string(),
            appointment_clock: appointment_clock(&view.appointment_time, display_offset),
            category_name: view.category_name.to_owned(),
            called_at: view.called_at,
        }
    }
}

pub fn appointment_clock(time: &AppointmentTime, display_offset: &FixedOffset) -> Option<String> {
    time.as_datetime()
        .map(|at| at.with_timezone(display_offset).format("%H:%M").to_string())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnData {
    pub turn: FilterTurnDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponseDto {
    pub status: String,
    pub data: TurnData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn view(appointment_time: AppointmentTime) -> TicketViewModel {
        TicketViewModel {
            number: "A-121".to_string(),
            status: TicketStatus::Waiting,
            tier: Tier::Normal,
            wait_minutes: 31,
            appointment_time,
            category_name: "Caja".to_string(),
            called_at: None,
        }
    }

    #[test]
    fn blank_code_fails_validation() {
        assert!(TicketCodeDto::new("   ").validate().is_err());
        assert!(TicketCodeDto::new(" A-121 ").validate().is_ok());
        assert_eq!(TicketCodeDto::new(" A-121 ").code, "A-121");
    }

    #[test]
    fn long_code_passes_validation() {
        let code = "Q".repeat(70);
        assert!(TicketCodeDto::new(&code).validate().is_ok());
    }

    #[test]
    fn clock_uses_display_offset() {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 15, 11, 0).unwrap();
        let bogota = FixedOffset::west_opt(5 * 3600).unwrap();

        let dto = FilterTurnDto::filter_turn(&view(AppointmentTime::At(at)), &bogota);
        assert_eq!(dto.appointment_clock.as_deref(), Some("10:11"));
        assert_eq!(dto.appointment_time, "2024-05-02T15:11:00+00:00");
        assert_eq!(dto.headline, "On the waiting list, stay alert so you arrive on time.");
    }

    #[test]
    fn unknown_appointment_has_no_clock() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let dto = FilterTurnDto::filter_turn(&view(AppointmentTime::Unknown), &utc);
        assert_eq!(dto.appointment_time, "unknown");
        assert_eq!(dto.appointment_clock, None);

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["waitMinutes"], 31);
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["categoryName"], "Caja");
    }
}
