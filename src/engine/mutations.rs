use std::time::Instant;

use tracing::info;

use crate::model::*;
use crate::observability::{BOOKINGS_CREATED_TOTAL, OP_CREATE_BOOKING, record_op};

use super::{Engine, EngineError};

impl Engine {
    /// Place `booking` in a free room and persist it.
    ///
    /// Decide, then mutate, then persist: on `Ok(true)` the caller's `booking`
    /// carries the assigned `room_id` and `is_active == true`, and exactly that
    /// value was handed to the booking store. On `Ok(false)` nothing was
    /// written and `booking` is untouched. If the store write fails the
    /// mutation stays applied and the store error is returned.
    pub async fn create_booking(&self, booking: &mut Booking) -> Result<bool, EngineError> {
        let started = Instant::now();
        let result = self.create_booking_inner(booking).await;
        record_op(OP_CREATE_BOOKING, result.is_ok(), started);
        result
    }

    async fn create_booking_inner(&self, booking: &mut Booking) -> Result<bool, EngineError> {
        let room_id = self.find_available_room(booking.start, booking.end).await?;
        if room_id == NO_ROOM {
            return Ok(false);
        }

        booking.room_id = room_id;
        booking.is_active = true;
        self.bookings.add(booking).await?;

        metrics::counter!(BOOKINGS_CREATED_TOTAL).increment(1);
        info!(
            "booking {} for customer {} placed in room {room_id} [{}, {}]",
            booking.id, booking.customer_id, booking.start, booking.end
        );
        Ok(true)
    }
}
