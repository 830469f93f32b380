use std::time::Instant;

use chrono::NaiveDate;
use tracing::debug;

use crate::model::*;
use crate::observability::{OP_FIND_AVAILABLE_ROOM, OP_FULLY_OCCUPIED_DATES, record_op};

use super::availability::{find_free_room, fully_occupied_dates};
use super::validate::{validate_query_window, validate_range, validate_stay};
use super::{Engine, EngineError};

impl Engine {
    /// Id of the first room free on every day of `[start, end]`, or `NO_ROOM`.
    ///
    /// `start` must be after today and not after `end`; otherwise this fails
    /// with `InvalidRange` without touching either store.
    pub async fn find_available_room(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RoomId, EngineError> {
        let started = Instant::now();
        let result = self.find_available_room_inner(start, end).await;
        record_op(OP_FIND_AVAILABLE_ROOM, result.is_ok(), started);
        result
    }

    async fn find_available_room_inner(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RoomId, EngineError> {
        let span = validate_stay(start, end, self.today())?;
        let (bookings, rooms) = self.snapshot().await?;

        let room_id = find_free_room(&rooms, &bookings, &span);
        if room_id == NO_ROOM {
            debug!("no room free for [{start}, {end}] among {} rooms", rooms.len());
        } else {
            debug!("room {room_id} free for [{start}, {end}]");
        }
        Ok(room_id)
    }

    /// Dates in `[start, end]`, ascending, on which no room is free.
    /// Past ranges are allowed.
    pub async fn fully_occupied_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, EngineError> {
        let started = Instant::now();
        let result = self.fully_occupied_dates_inner(start, end).await;
        record_op(OP_FULLY_OCCUPIED_DATES, result.is_ok(), started);
        result
    }

    async fn fully_occupied_dates_inner(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, EngineError> {
        let window = validate_range(start, end)?;
        validate_query_window(&window)?;
        let (bookings, rooms) = self.snapshot().await?;

        let dates = fully_occupied_dates(&rooms, &bookings, &window);
        debug!(
            "{} fully occupied dates in [{start}, {end}] ({} rooms, {} bookings)",
            dates.len(),
            rooms.len(),
            bookings.len()
        );
        Ok(dates)
    }
}
