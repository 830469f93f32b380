use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use tokio_test::{assert_err, assert_ok};

use super::*;

/// Store double that counts calls and can be told to fail.
struct RecordingStore<T> {
    items: Mutex<Vec<T>>,
    get_all_calls: AtomicUsize,
    add_calls: AtomicUsize,
    fail_reads: bool,
    fail_writes: bool,
}

impl<T: Clone> RecordingStore<T> {
    fn new(items: Vec<T>) -> Arc<Self> {
        Arc::new(Self::plain(items))
    }

    fn failing_reads(items: Vec<T>) -> Arc<Self> {
        Arc::new(Self {
            fail_reads: true,
            ..Self::plain(items)
        })
    }

    fn failing_writes(items: Vec<T>) -> Arc<Self> {
        Arc::new(Self {
            fail_writes: true,
            ..Self::plain(items)
        })
    }

    fn plain(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            get_all_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
            fail_reads: false,
            fail_writes: false,
        }
    }

    fn reads(&self) -> usize {
        self.get_all_calls.load(Ordering::SeqCst)
    }

    fn writes(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> Store<T> for RecordingStore<T> {
    async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        self.get_all_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(StoreError::Io("read refused".into()));
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn add(&self, item: &T) -> Result<(), StoreError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StoreError::Io("write refused".into()));
        }
        self.items.lock().unwrap().push(item.clone());
        Ok(())
    }
}

/// Fixed "today" so date arithmetic in tests never straddles midnight.
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 5, 1).unwrap()
}

fn day(offset: i64) -> NaiveDate {
    if offset >= 0 {
        today() + Days::new(offset as u64)
    } else {
        today() - Days::new(offset.unsigned_abs())
    }
}

fn rooms(ids: &[RoomId]) -> Vec<Room> {
    ids.iter().map(|&id| Room::new(id, format!("room {id}"))).collect()
}

fn active(id: i64, room_id: RoomId, start: i64, end: i64) -> Booking {
    Booking {
        id,
        start: day(start),
        end: day(end),
        is_active: true,
        room_id,
        customer_id: id,
    }
}

type Stores = (Arc<RecordingStore<Booking>>, Arc<RecordingStore<Room>>);

fn engine_with(bookings: Vec<Booking>, room_list: Vec<Room>) -> (Engine, Stores) {
    let booking_store = RecordingStore::new(bookings);
    let room_store = RecordingStore::new(room_list);
    let engine = Engine::new(booking_store.clone(), room_store.clone()).with_clock(today);
    (engine, (booking_store, room_store))
}

/// Two rooms, both fully booked from day 10 through day 20.
fn hotel_booked_10_to_20() -> (Engine, Stores) {
    engine_with(
        vec![active(1, 1, 10, 20), active(2, 2, 10, 20)],
        rooms(&[1, 2]),
    )
}

// ── find_available_room ──────────────────────────────────

#[tokio::test]
async fn find_rejects_start_today_without_store_calls() {
    let (engine, (bookings, room_store)) = hotel_booked_10_to_20();
    let result = engine.find_available_room(day(0), day(0)).await;
    assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
    assert_eq!(bookings.reads(), 0);
    assert_eq!(room_store.reads(), 0);
}

#[tokio::test]
async fn find_rejects_past_start_without_store_calls() {
    let (engine, (bookings, room_store)) = hotel_booked_10_to_20();
    let result = engine.find_available_room(day(-1), day(3)).await;
    assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
    assert_eq!(bookings.reads() + room_store.reads(), 0);
}

#[tokio::test]
async fn find_rejects_start_after_end_without_store_calls() {
    let (engine, (bookings, room_store)) = hotel_booked_10_to_20();
    let result = engine.find_available_room(day(4), day(3)).await;
    assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
    assert_eq!(bookings.reads() + room_store.reads(), 0);
}

#[tokio::test]
async fn find_tomorrow_returns_a_room() {
    let (engine, (bookings, room_store)) = hotel_booked_10_to_20();
    let room_id = assert_ok!(engine.find_available_room(day(1), day(1)).await);
    assert_ne!(room_id, NO_ROOM);
    assert!(bookings.reads() >= 1);
    assert!(room_store.reads() >= 1);
}

#[tokio::test]
async fn find_returns_room_without_overlapping_booking() {
    let (engine, (bookings, _)) = engine_with(
        vec![active(1, 1, 1, 3), active(2, 2, 5, 9)],
        rooms(&[1, 2, 3]),
    );
    let query = DateSpan::new(day(2), day(6));
    let room_id = engine.find_available_room(query.start, query.end).await.unwrap();
    assert_eq!(room_id, 3);
    assert!(
        bookings
            .items()
            .iter()
            .all(|b| b.room_id != room_id || !b.occupies(&query))
    );
}

#[tokio::test]
async fn find_all_rooms_taken_returns_no_room() {
    let (engine, _) = hotel_booked_10_to_20();
    assert_eq!(engine.find_available_room(day(12), day(13)).await.unwrap(), NO_ROOM);
    assert_eq!(engine.find_available_room(day(5), day(10)).await.unwrap(), NO_ROOM);
    assert_eq!(engine.find_available_room(day(20), day(25)).await.unwrap(), NO_ROOM);
}

#[tokio::test]
async fn find_either_side_of_booked_window() {
    let (engine, _) = hotel_booked_10_to_20();
    assert_eq!(engine.find_available_room(day(5), day(9)).await.unwrap(), 1);
    assert_eq!(engine.find_available_room(day(21), day(22)).await.unwrap(), 1);
}

#[tokio::test]
async fn find_no_rooms_returns_no_room() {
    let (engine, _) = engine_with(vec![], vec![]);
    assert_eq!(engine.find_available_room(day(2), day(3)).await.unwrap(), NO_ROOM);
}

#[tokio::test]
async fn find_first_room_in_store_order() {
    let (engine, _) = engine_with(vec![active(1, 7, 1, 5)], rooms(&[7, 4, 2]));
    assert_eq!(engine.find_available_room(day(2), day(3)).await.unwrap(), 4);
}

#[tokio::test]
async fn find_propagates_store_failure() {
    let booking_store = RecordingStore::<Booking>::failing_reads(vec![]);
    let room_store = RecordingStore::new(rooms(&[1]));
    let engine = Engine::new(booking_store, room_store).with_clock(today);
    let err = assert_err!(engine.find_available_room(day(2), day(3)).await);
    assert!(matches!(err, EngineError::Store(StoreError::Io(_))));
}

// ── fully_occupied_dates ─────────────────────────────────

#[tokio::test]
async fn occupied_no_bookings_is_empty() {
    let (engine, _) = engine_with(vec![], rooms(&[1, 2]));
    let dates = engine.fully_occupied_dates(day(0), day(1)).await.unwrap();
    assert!(dates.is_empty());
}

#[tokio::test]
async fn occupied_no_rooms_is_empty() {
    let (engine, _) = engine_with(vec![active(1, 1, 0, 5)], vec![]);
    let dates = engine.fully_occupied_dates(day(0), day(5)).await.unwrap();
    assert!(dates.is_empty());
}

#[tokio::test]
async fn occupied_start_after_end_is_invalid() {
    let (engine, (bookings, room_store)) = engine_with(vec![], vec![]);
    let result = engine.fully_occupied_dates(day(6), day(0)).await;
    assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
    assert_eq!(bookings.reads() + room_store.reads(), 0);
}

#[tokio::test]
async fn occupied_window_too_wide() {
    let (engine, _) = engine_with(vec![], rooms(&[1]));
    let result = engine
        .fully_occupied_dates(day(0), day(crate::limits::MAX_QUERY_DAYS))
        .await;
    assert!(matches!(result, Err(EngineError::LimitExceeded(_))));
}

#[tokio::test]
async fn occupied_all_rooms_booked_returns_every_date() {
    let (engine, _) = engine_with(
        vec![
            active(1, 1, 0, 5),
            active(2, 1, 0, 6),
            active(3, 2, 0, 5),
            active(4, 3, 0, 8),
        ],
        rooms(&[1, 2, 3]),
    );
    let dates = engine.fully_occupied_dates(day(0), day(5)).await.unwrap();
    assert_eq!(dates, (0..=5).map(day).collect::<Vec<_>>());
}

#[tokio::test]
async fn occupied_one_room_free_in_window_is_empty() {
    let (engine, _) = engine_with(
        vec![active(1, 1, 0, 5), active(2, 1, 10, 15), active(3, 3, 0, 8)],
        rooms(&[1, 2, 3]),
    );
    let dates = engine.fully_occupied_dates(day(0), day(5)).await.unwrap();
    assert!(dates.is_empty());
}

#[tokio::test]
async fn occupied_only_days_every_room_is_taken() {
    let (engine, _) = engine_with(
        vec![
            active(1, 1, 0, 5),
            active(2, 2, 0, 4),
            active(3, 3, 0, 2),
        ],
        rooms(&[1, 2, 3]),
    );
    let dates = engine.fully_occupied_dates(day(0), day(5)).await.unwrap();
    assert_eq!(dates, vec![day(0), day(1), day(2)]);
}

#[tokio::test]
async fn occupied_inactive_bookings_ignored() {
    let mut cancelled = active(2, 2, 0, 5);
    cancelled.is_active = false;
    let (engine, _) = engine_with(vec![active(1, 1, 0, 5), cancelled], rooms(&[1, 2]));
    let dates = engine.fully_occupied_dates(day(0), day(5)).await.unwrap();
    assert!(dates.is_empty());
}

#[tokio::test]
async fn occupied_past_range_allowed() {
    let (engine, _) = engine_with(vec![active(1, 1, -10, -8)], rooms(&[1]));
    let dates = engine.fully_occupied_dates(day(-9), day(-7)).await.unwrap();
    assert_eq!(dates, vec![day(-9), day(-8)]);
}

// ── create_booking ───────────────────────────────────────

#[tokio::test]
async fn create_assigns_room_and_persists_mutated_booking() {
    let (engine, (bookings, room_store)) = engine_with(vec![], rooms(&[1]));
    let mut booking = Booking::request(day(2), day(3), 7);

    let created = engine.create_booking(&mut booking).await.unwrap();

    assert!(created);
    assert!(booking.is_active);
    assert!(booking.room_id >= 0);
    assert_eq!(bookings.writes(), 1);
    assert_eq!(bookings.items(), vec![booking.clone()]);
    assert!(bookings.reads() >= 1);
    assert!(room_store.reads() >= 1);
}

#[tokio::test]
async fn create_without_rooms_writes_nothing() {
    let (engine, (bookings, _)) = engine_with(vec![], vec![]);
    let mut booking = Booking::request(day(2), day(3), 7);

    let created = engine.create_booking(&mut booking).await.unwrap();

    assert!(!created);
    assert!(!booking.is_active);
    assert_eq!(booking.room_id, NO_ROOM);
    assert_eq!(bookings.writes(), 0);
}

#[tokio::test]
async fn create_when_every_room_conflicts_writes_nothing() {
    let (engine, (bookings, _)) = hotel_booked_10_to_20();
    let mut booking = Booking::request(day(15), day(16), 7);
    let before = booking.clone();

    assert!(!engine.create_booking(&mut booking).await.unwrap());
    assert_eq!(booking, before);
    assert_eq!(bookings.writes(), 0);
}

#[tokio::test]
async fn create_invalid_range_propagates() {
    let (engine, (bookings, room_store)) = hotel_booked_10_to_20();
    let mut booking = Booking::request(day(0), day(3), 7);

    let err = assert_err!(engine.create_booking(&mut booking).await);

    assert!(matches!(err, EngineError::InvalidRange { .. }));
    assert!(!booking.is_active);
    assert_eq!(bookings.reads() + room_store.reads() + bookings.writes(), 0);
}

#[tokio::test]
async fn create_write_failure_keeps_mutation() {
    let booking_store = RecordingStore::<Booking>::failing_writes(vec![]);
    let room_store = RecordingStore::new(rooms(&[4]));
    let engine = Engine::new(booking_store.clone(), room_store).with_clock(today);
    let mut booking = Booking::request(day(2), day(3), 7);

    let err = assert_err!(engine.create_booking(&mut booking).await);

    assert!(matches!(err, EngineError::Store(_)));
    assert!(booking.is_active);
    assert_eq!(booking.room_id, 4);
    assert_eq!(booking_store.writes(), 1);
    assert!(booking_store.items().is_empty());
}

#[tokio::test]
async fn sequential_creates_fill_the_hotel() {
    let booking_store = Arc::new(InMemoryStore::<Booking>::new());
    let room_store = Arc::new(InMemoryStore::with_items(rooms(&[1, 2])));
    let engine = Engine::new(booking_store.clone(), room_store).with_clock(today);

    let mut first = Booking::request(day(3), day(6), 1);
    let mut second = Booking::request(day(5), day(8), 2);
    let mut third = Booking::request(day(6), day(6), 3);
    let mut later = Booking::request(day(7), day(9), 4);

    assert!(engine.create_booking(&mut first).await.unwrap());
    assert!(engine.create_booking(&mut second).await.unwrap());
    assert!(!engine.create_booking(&mut third).await.unwrap());
    assert!(engine.create_booking(&mut later).await.unwrap());

    assert_eq!(first.room_id, 1);
    assert_eq!(second.room_id, 2);
    assert_eq!(third.room_id, NO_ROOM);
    assert_eq!(later.room_id, 1);
    assert_eq!(booking_store.len().await, 3);

    let dates = engine.fully_occupied_dates(day(3), day(9)).await.unwrap();
    assert_eq!(dates, vec![day(5), day(6), day(7), day(8)]);
}

#[tokio::test]
async fn today_comes_from_clock() {
    let (engine, _) = engine_with(vec![], vec![]);
    assert_eq!(engine.today(), today());

    let default_engine = Engine::new(
        Arc::new(InMemoryStore::<Booking>::new()),
        Arc::new(InMemoryStore::<Room>::new()),
    );
    assert_eq!(default_engine.today(), local_today());
}
