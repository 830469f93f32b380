use chrono::NaiveDate;
use tracing::debug;

use crate::limits::MAX_QUERY_DAYS;
use crate::model::DateSpan;

use super::EngineError;

/// Current local calendar date, time of day dropped.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<DateSpan, EngineError> {
    if start > end {
        debug!("rejecting range [{start}, {end}]: start after end");
        return Err(EngineError::InvalidRange {
            start,
            end,
            reason: "start date is after end date",
        });
    }
    Ok(DateSpan::new(start, end))
}

/// A new stay must begin strictly after `today`.
pub(crate) fn validate_stay(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<DateSpan, EngineError> {
    if start <= today {
        debug!("rejecting range [{start}, {end}]: start not after {today}");
        return Err(EngineError::InvalidRange {
            start,
            end,
            reason: "start date must be in the future",
        });
    }
    validate_range(start, end)
}

pub(crate) fn validate_query_window(span: &DateSpan) -> Result<(), EngineError> {
    if span.len_days() > MAX_QUERY_DAYS {
        return Err(EngineError::LimitExceeded("query window too wide"));
    }
    Ok(())
}
