use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::models::appointment::{AppointmentRequest, BookingRecord, BookingStatus, Customer};
use crate::state::AppState;

const PENDING_WARNING: &str = "Calendar integration temporarily unavailable";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedAppointment {
    pub id: String,
    pub service: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_link: Option<String>,
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub success: bool,
    pub booking_id: String,
    pub message: String,
    pub appointment: BookedAppointment,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<BookingRecord> for BookingResponse {
    fn from(record: BookingRecord) -> Self {
        let pending = record.is_pending();
        let event_link = match &record.status {
            BookingStatus::Confirmed { event_link, .. } => event_link.clone(),
            BookingStatus::PendingConfirmation { .. } => None,
        };
        let appointment = record.appointment;

        Self {
            success: true,
            booking_id: record.id.clone(),
            message: if pending {
                "Appointment booked successfully (confirmation pending)".to_string()
            } else {
                "Appointment booked successfully".to_string()
            },
            appointment: BookedAppointment {
                id: record.id,
                service: appointment.service_type,
                start_time: appointment.start_time,
                end_time: appointment.end_time,
                event_link,
                customer: appointment.customer,
                notes: appointment.notes,
            },
            status: record.status,
            fallback: pending.then_some(true),
            warning: pending.then(|| PENDING_WARNING.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PendingBookingsResponse {
    pub success: bool,
    pub count: usize,
    pub bookings: Vec<BookingRecord>,
}

pub async fn book_appointment(
    state: &AppState,
    request: &AppointmentRequest,
) -> Result<BookingResponse, ApiError> {
    let record = state.resolver.book(request).await?;
    info!(
        booking_id = %record.id,
        pending = record.is_pending(),
        service = %record.appointment.service_type,
        "New booking"
    );
    Ok(record.into())
}

pub async fn pending_booking(state: &AppState, id: &str) -> Result<BookingRecord, ApiError> {
    state
        .resolver
        .pending_booking(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("pending booking {id}")))
}

pub fn pending_bookings(state: &AppState) -> PendingBookingsResponse {
    let bookings = state.resolver.pending_bookings();
    PendingBookingsResponse {
        success: true,
        count: bookings.len(),
        bookings,
    }
}
