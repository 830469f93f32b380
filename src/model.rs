use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type RoomId = i64;

/// Returned by room search when every room is taken. Valid room ids are >= 0.
pub const NO_ROOM: RoomId = -1;

/// Inclusive calendar range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "DateSpan start must not be after end");
        Self { start, end }
    }

    /// Inclusive overlap: `[a,b]` and `[c,d]` overlap iff `!(b < c || a > d)`.
    pub fn overlaps(&self, other: &DateSpan) -> bool {
        !(self.end < other.start || self.start > other.end)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Intersection with `other`, if any.
    pub fn clamp_to(&self, other: &DateSpan) -> Option<DateSpan> {
        if !self.overlaps(other) {
            return None;
        }
        Some(DateSpan::new(
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub description: String,
}

impl Room {
    pub fn new(id: RoomId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A stay in one room. Only active bookings occupy their room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub is_active: bool,
    /// `NO_ROOM` until the engine assigns one.
    pub room_id: RoomId,
    pub customer_id: i64,
}

impl Booking {
    /// A booking request: dates and customer only, not yet placed in a room.
    pub fn request(start: NaiveDate, end: NaiveDate, customer_id: i64) -> Self {
        Self {
            id: 0,
            start,
            end,
            is_active: false,
            room_id: NO_ROOM,
            customer_id,
        }
    }

    pub fn span(&self) -> DateSpan {
        DateSpan {
            start: self.start,
            end: self.end,
        }
    }

    /// True if this booking holds its room on any day of `span`.
    pub fn occupies(&self, span: &DateSpan) -> bool {
        self.is_active && self.span().overlaps(span)
    }
}
