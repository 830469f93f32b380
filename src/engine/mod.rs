mod availability;
mod error;
mod mutations;
mod queries;
mod store;
mod validate;
#[cfg(test)]
mod tests;

pub use availability::{
    compute_saturated_spans, find_free_room, fully_occupied_dates, merge_overlapping, occupied_rooms,
};
pub use error::{EngineError, StoreError};
pub use store::{InMemoryStore, Store, WalStore};
pub use validate::local_today;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::model::*;

/// Source of "today" for the future-start check.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Availability decisions over a booking store and a room store.
///
/// Holds no state between calls: every operation reads full snapshots from
/// both stores and decides in memory. Two callers creating bookings for the
/// same dates at the same time can both be handed the same room; serialize
/// writes at the store if that matters.
pub struct Engine {
    bookings: Arc<dyn Store<Booking>>,
    rooms: Arc<dyn Store<Room>>,
    clock: Clock,
}

impl Engine {
    pub fn new(bookings: Arc<dyn Store<Booking>>, rooms: Arc<dyn Store<Room>>) -> Self {
        Self {
            bookings,
            rooms,
            clock: Arc::new(local_today),
        }
    }

    /// Replace the local-date clock, e.g. to pin "today" in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Full booking and room snapshots, bookings read first.
    async fn snapshot(&self) -> Result<(Vec<Booking>, Vec<Room>), EngineError> {
        let bookings = self.bookings.get_all().await?;
        let rooms = self.rooms.get_all().await?;
        Ok((bookings, rooms))
    }
}
