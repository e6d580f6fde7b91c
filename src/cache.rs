use moka::future::Cache;

use crate::models::appointment::BookingRecord;

const PENDING_CAPACITY: u64 = 500;

/// Bookings accepted while the calendar was unreachable, kept until someone
/// reconciles them by hand.
#[derive(Clone)]
pub struct PendingBookingStore {
    bookings: Cache<String, BookingRecord>,
}

impl PendingBookingStore {
    pub fn new() -> Self {
        Self::with_capacity(PENDING_CAPACITY)
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            bookings: Cache::new(capacity),
        }
    }

    pub async fn insert(&self, record: BookingRecord) {
        self.bookings.insert(record.id.clone(), record).await;
    }

    pub async fn get(&self, id: &str) -> Option<BookingRecord> {
        self.bookings.get(id).await
    }

    /// Oldest first.
    pub fn list(&self) -> Vec<BookingRecord> {
        let mut records: Vec<_> = self.bookings.iter().map(|entry| entry.1).collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

impl Default for PendingBookingStore {
    fn default() -> Self {
        Self::new()
    }
}
