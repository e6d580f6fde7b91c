use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::models::service::service_duration;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Raw booking body. Every field is optional here so that missing fields turn
/// into a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub slot_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub service_type: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub slot_id: String,
    pub service_type: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_time(field: &'static str, value: &str) -> Result<DateTime<FixedOffset>, BookingError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| BookingError::InvalidTime {
        field,
        value: value.to_string(),
    })
}

impl AppointmentRequest {
    pub fn validate(&self) -> Result<Appointment, BookingError> {
        let slot_id = present(&self.slot_id);
        let start_time = present(&self.start_time);
        let service_type = present(&self.service_type);
        let customer_name = present(&self.customer_name);
        let customer_email = present(&self.customer_email);

        let mut missing = Vec::new();
        if slot_id.is_none() {
            missing.push("slotId");
        }
        if start_time.is_none() {
            missing.push("startTime");
        }
        if service_type.is_none() {
            missing.push("serviceType");
        }
        if customer_name.is_none() {
            missing.push("customerName");
        }
        if customer_email.is_none() {
            missing.push("customerEmail");
        }

        let (
            Some(slot_id),
            Some(start_time),
            Some(service_type),
            Some(customer_name),
            Some(customer_email),
        ) = (slot_id, start_time, service_type, customer_name, customer_email)
        else {
            return Err(BookingError::MissingFields(missing));
        };

        if !EMAIL_SHAPE.is_match(&customer_email) {
            return Err(BookingError::InvalidEmail(customer_email));
        }

        let start = parse_time("startTime", &start_time)?;
        let end = match present(&self.end_time) {
            Some(end) => parse_time("endTime", &end)?,
            None => start + service_duration(&service_type),
        };
        if end <= start {
            return Err(BookingError::InvalidTime {
                field: "endTime",
                value: end.to_rfc3339(),
            });
        }

        Ok(Appointment {
            slot_id,
            service_type,
            start_time: start,
            end_time: end,
            customer: Customer {
                name: customer_name,
                email: customer_email,
                phone: present(&self.customer_phone),
            },
            notes: present(&self.notes),
        })
    }
}

/// Event written to the calendar for a confirmed booking.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedEvent {
    pub event_id: String,
    pub event_link: Option<String>,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BookingStatus {
    Confirmed {
        event_id: String,
        event_link: Option<String>,
    },
    /// Accepted without a calendar event; a later sweep can retry the write.
    PendingConfirmation { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    pub status: BookingStatus,
    pub appointment: Appointment,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn confirmed(appointment: Appointment, event: CreatedEvent) -> Self {
        let appointment = Appointment {
            start_time: event.start_time,
            end_time: event.end_time,
            ..appointment
        };
        Self {
            id: event.event_id.clone(),
            status: BookingStatus::Confirmed {
                event_id: event.event_id,
                event_link: event.event_link,
            },
            appointment,
            created_at: Utc::now(),
        }
    }

    pub fn pending(appointment: Appointment, reason: impl Into<String>) -> Self {
        Self {
            id: format!("booking_{}", uuid::Uuid::new_v4()),
            status: BookingStatus::PendingConfirmation {
                reason: reason.into(),
            },
            appointment,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, BookingStatus::PendingConfirmation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_request() -> AppointmentRequest {
        AppointmentRequest {
            slot_id: Some("2026-10-19-09-00".into()),
            start_time: Some("2026-10-19T09:00:00-04:00".into()),
            end_time: None,
            service_type: Some("Premium Haircut".into()),
            customer_name: Some("Jordan Lee".into()),
            customer_email: Some("jordan@example.com".into()),
            customer_phone: Some("  ".into()),
            notes: Some("Skin fade".into()),
        }
    }

    #[test]
    fn derives_end_time_from_service_duration() {
        let appointment = valid_request().validate().unwrap();
        assert_eq!(
            appointment.end_time.to_rfc3339(),
            "2026-10-19T09:30:00-04:00"
        );
        assert_eq!(appointment.customer.phone, None);
    }

    #[test]
    fn reports_every_missing_field() {
        let request = AppointmentRequest {
            slot_id: None,
            customer_email: Some(" ".into()),
            ..valid_request()
        };
        assert_eq!(
            request.validate(),
            Err(BookingError::MissingFields(vec!["slotId", "customerEmail"]))
        );
    }

    #[test]
    fn rejects_malformed_email_and_times() {
        let bad_email = AppointmentRequest {
            customer_email: Some("jordan.example.com".into()),
            ..valid_request()
        };
        assert!(matches!(
            bad_email.validate(),
            Err(BookingError::InvalidEmail(_))
        ));

        let bad_time = AppointmentRequest {
            start_time: Some("tomorrow at nine".into()),
            ..valid_request()
        };
        assert!(matches!(
            bad_time.validate(),
            Err(BookingError::InvalidTime { field: "startTime", .. })
        ));
    }

    #[test]
    fn pending_ids_do_not_look_like_event_ids() {
        let record = BookingRecord::pending(valid_request().validate().unwrap(), "down");
        assert!(record.id.starts_with("booking_"));
        assert!(record.is_pending());

        let json = serde_json::to_value(&record.status).unwrap();
        assert_eq!(json["state"], "pendingConfirmation");
        assert_eq!(json["reason"], "down");
    }
}
