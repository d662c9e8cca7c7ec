// libs/appointment-cell/src/services/conflict.rs
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::Appointment;

/// Half-open window overlap: [s1, e1) intersects [s2, e2) iff
/// s1 < e2 AND s2 < e1. Back-to-back slots do not overlap.
pub fn windows_overlap(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

/// Find an appointment that blocks the proposed window for this doctor.
///
/// Only occupying statuses reserve calendar time; terminal appointments never
/// conflict. `exclude` skips the appointment being moved so a reschedule does
/// not collide with itself. Callers must hold the store's write lock across
/// this check and the subsequent write.
pub fn find_conflict<'a>(
    appointments: &'a [Appointment],
    doctor_email: &str,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    exclude: Option<Uuid>,
) -> Option<&'a Appointment> {
    appointments.iter().find(|a| {
        a.doctor_email == doctor_email
            && a.date == date
            && Some(a.id) != exclude
            && a.status.occupies_calendar()
            && windows_overlap(start_time, end_time, a.start_time, a.end_time)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn overlapping_windows() {
        assert!(windows_overlap(t(9, 0), t(9, 30), t(9, 15), t(9, 45)));
        assert!(windows_overlap(t(9, 15), t(9, 45), t(9, 0), t(9, 30)));
        assert!(windows_overlap(t(9, 0), t(10, 0), t(9, 15), t(9, 30)));
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        assert!(!windows_overlap(t(9, 0), t(9, 30), t(9, 30), t(10, 0)));
        assert!(!windows_overlap(t(9, 30), t(10, 0), t(9, 0), t(9, 30)));
    }

    #[test]
    fn disjoint_windows_do_not_overlap() {
        assert!(!windows_overlap(t(8, 0), t(8, 30), t(9, 0), t(9, 30)));
    }
}
