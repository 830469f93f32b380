/// Widest window `fully_occupied_dates` will scan, in days (about 100 years).
pub const MAX_QUERY_DAYS: i64 = 36_600;

/// Pending appends buffered between a store and its WAL writer task.
pub const WAL_CHANNEL_CAPACITY: usize = 4096;
