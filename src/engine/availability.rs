use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::model::*;

// ── Day ordinals ──────────────────────────────────────────────────

fn ordinal(d: NaiveDate) -> i64 {
    d.num_days_from_ce() as i64
}

fn from_ordinal(n: i64) -> Option<NaiveDate> {
    i32::try_from(n)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

// ── Room search ───────────────────────────────────────────────────

/// Rooms holding at least one active booking that overlaps `span`.
pub fn occupied_rooms(bookings: &[Booking], span: &DateSpan) -> HashSet<RoomId> {
    bookings
        .iter()
        .filter(|b| b.occupies(span))
        .map(|b| b.room_id)
        .collect()
}

/// First room, in `rooms` order, with nothing booked over `span`.
/// `NO_ROOM` when every room is taken or there are no rooms.
pub fn find_free_room(rooms: &[Room], bookings: &[Booking], span: &DateSpan) -> RoomId {
    let occupied = occupied_rooms(bookings, span);
    rooms
        .iter()
        .find(|r| !occupied.contains(&r.id))
        .map_or(NO_ROOM, |r| r.id)
}

// ── Occupancy ─────────────────────────────────────────────────────

/// Merge sorted overlapping/adjacent inclusive spans into disjoint spans.
/// `[1,3]` and `[4,6]` are adjacent and merge to `[1,6]`.
pub fn merge_overlapping(sorted: &[DateSpan]) -> Vec<DateSpan> {
    let mut merged: Vec<DateSpan> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && ordinal(span.start) <= ordinal(last.end) + 1
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

/// Sweep-line: day ranges where at least `capacity` of the given tracks are
/// covered at once. Each track must already be disjoint (see `merge_overlapping`),
/// so the running count is the number of distinct tracks covering a day.
pub fn compute_saturated_spans(tracks: &[Vec<DateSpan>], capacity: usize) -> Vec<DateSpan> {
    if capacity == 0 || tracks.len() < capacity {
        return Vec::new();
    }

    // +1 on the first day, -1 on the day after the last.
    let mut events: Vec<(i64, i64)> = Vec::new();
    for span in tracks.iter().flatten() {
        events.push((ordinal(span.start), 1));
        events.push((ordinal(span.end) + 1, -1));
    }
    events.sort_unstable();

    let mut saturated: Vec<(i64, i64)> = Vec::new();
    let mut count: i64 = 0;
    let mut i = 0;
    while i < events.len() {
        let day = events[i].0;
        while i < events.len() && events[i].0 == day {
            count += events[i].1;
            i += 1;
        }
        if count < capacity as i64 {
            continue;
        }
        // A covered day always has a later closing event.
        let Some(&(next_day, _)) = events.get(i) else {
            break;
        };
        match saturated.last_mut() {
            Some(last) if last.1 + 1 == day => last.1 = next_day - 1,
            _ => saturated.push((day, next_day - 1)),
        }
    }

    saturated
        .into_iter()
        .filter_map(|(s, e)| Some(DateSpan::new(from_ordinal(s)?, from_ordinal(e)?)))
        .collect()
}

/// Days in `window` on which every room in `rooms` has an active booking.
/// Bookings on rooms outside `rooms` are ignored. No rooms → no days.
pub fn fully_occupied_dates(
    rooms: &[Room],
    bookings: &[Booking],
    window: &DateSpan,
) -> Vec<NaiveDate> {
    let inventory: HashSet<RoomId> = rooms.iter().map(|r| r.id).collect();
    if inventory.is_empty() {
        return Vec::new();
    }

    let mut by_room: HashMap<RoomId, Vec<DateSpan>> = HashMap::new();
    for booking in bookings {
        if !booking.is_active || !inventory.contains(&booking.room_id) {
            continue;
        }
        if let Some(clamped) = booking.span().clamp_to(window) {
            by_room.entry(booking.room_id).or_default().push(clamped);
        }
    }

    // Some room is free for the whole window.
    if by_room.len() < inventory.len() {
        return Vec::new();
    }

    let tracks: Vec<Vec<DateSpan>> = by_room
        .into_values()
        .map(|mut spans| {
            spans.sort_by_key(|s| s.start);
            merge_overlapping(&spans)
        })
        .collect();

    compute_saturated_spans(&tracks, inventory.len())
        .iter()
        .flat_map(|s| s.days())
        .collect()
}
