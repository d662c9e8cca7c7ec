// libs/appointment-cell/src/services/projection.rs
use chrono::NaiveDate;

use crate::models::{Appointment, DayBucket};

/// Partition a date against the caller's current date. Recomputed per
/// request; never stored.
pub fn bucket_for(date: NaiveDate, today: NaiveDate) -> DayBucket {
    if date == today {
        DayBucket::Today
    } else if date > today {
        DayBucket::Upcoming
    } else {
        DayBucket::Past
    }
}

/// Stable listing order relied on by callers for display: date ascending,
/// then start time ascending.
pub fn sort_for_listing(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|a| (a.date, a.start_time));
}
