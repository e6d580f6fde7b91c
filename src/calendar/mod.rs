pub mod auth;
pub mod free_slots;
pub mod google;

use async_trait::async_trait;

use crate::error::CalendarError;
use crate::models::appointment::{Appointment, CreatedEvent};
use crate::models::slot::Slot;

pub use google::GoogleCalendar;

/// The business calendar: the primary source of availability and the only
/// place a booking becomes confirmed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Sets up credentials and probes the API once. Logs and returns false on
    /// any failure; calling it again after success is a no-op.
    async fn initialize(&self) -> bool;

    async fn available_slots(&self, service: &str, days_ahead: u32) -> Result<Vec<Slot>, CalendarError>;

    async fn create_appointment(&self, appointment: &Appointment) -> Result<CreatedEvent, CalendarError>;

    fn is_initialized(&self) -> bool;

    fn authorization_url(&self) -> Option<String>;
}
