use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Appointment, Booking, Doctor, RejectReason};

pub enum CommitOutcome {
    Committed(Appointment),
    Rejected(RejectReason),
}

/// Pure availability check for a fully specified slot: working hours first,
/// then overlap against the doctor's committed appointments that day.
/// `Ok(None)` means the slot is free; an `Err` is a storage failure and says
/// nothing about the slot.
pub fn validate_slot(
    conn: &Connection,
    doctor: &Doctor,
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: i64,
) -> anyhow::Result<Option<RejectReason>> {
    if !doctor.hours.is_open_on(date) {
        return Ok(Some(RejectReason::ClosedDay {
            hours: doctor.hours.to_human_readable(),
        }));
    }
    if !doctor.hours.covers(date, time, duration_minutes) {
        return Ok(Some(RejectReason::OutOfHours {
            hours: doctor.hours.to_human_readable(),
        }));
    }

    let start = date.and_time(time);
    let end = start + Duration::minutes(duration_minutes);
    let existing = queries::appointments_for_day(conn, &doctor.name, date)?;
    if existing.iter().any(|a| overlaps(a, start, end)) {
        return Ok(Some(RejectReason::SlotTaken));
    }

    Ok(None)
}

/// Writes the booking as a committed appointment. The overlap check is
/// repeated here against the live table because another call may have
/// validated the same slot in the meantime; the caller holds the connection
/// lock across this whole read-check-write sequence, so the second writer of
/// a race always sees the first writer's row and loses.
pub fn commit_appointment(
    conn: &Connection,
    booking: &Booking,
) -> anyhow::Result<CommitOutcome> {
    let Some(appointment) = Appointment::from_booking(booking) else {
        anyhow::bail!("commit attempted before all booking fields were collected");
    };

    let start = appointment.starts_at();
    let end = appointment.ends_at();
    let existing = queries::appointments_for_day(conn, &appointment.doctor, appointment.date)?;
    if existing.iter().any(|a| overlaps(a, start, end)) {
        return Ok(CommitOutcome::Rejected(RejectReason::SlotTaken));
    }

    queries::insert_appointment(conn, &appointment)?;
    Ok(CommitOutcome::Committed(appointment))
}

/// Half-open intervals: an appointment ending exactly when the next one
/// starts is not a conflict.
fn overlaps(existing: &Appointment, start: NaiveDateTime, end: NaiveDateTime) -> bool {
    existing.starts_at() < end && existing.ends_at() > start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Roster, WorkingHours};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn hasan() -> Doctor {
        Roster::default_clinic()
            .get("Dr. Hasan Rahman")
            .cloned()
            .unwrap()
    }

    fn weekday_doctor() -> Doctor {
        Doctor {
            name: "Dr. Gregory House".to_string(),
            aliases: vec!["house".to_string()],
            hours: WorkingHours {
                days: vec!["mon".to_string(), "tue".to_string()],
                start: "09:00".to_string(),
                end: "17:00".to_string(),
            },
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn complete_booking(doctor: &str, d: &str, t: &str) -> Booking {
        let mut booking = Booking::default();
        booking.doctor = Some(doctor.to_string());
        booking.patient_name = Some("Peter Griffin".to_string());
        booking.phone = Some("01553702359".to_string());
        booking.service = Some("Root canal".to_string());
        booking.date = Some(date(d));
        booking.time = Some(time(t));
        booking
    }

    fn commit(conn: &Connection, doctor: &str, d: &str, t: &str) -> CommitOutcome {
        commit_appointment(conn, &complete_booking(doctor, d, t)).unwrap()
    }

    #[test]
    fn test_free_slot_within_hours() {
        let conn = setup_db();
        let result = validate_slot(&conn, &hasan(), date("2026-09-10"), time("15:30"), 60).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_out_of_hours() {
        let conn = setup_db();
        let result = validate_slot(&conn, &hasan(), date("2026-09-10"), time("10:00"), 60).unwrap();
        assert!(matches!(result, Some(RejectReason::OutOfHours { .. })));
    }

    #[test]
    fn test_slot_ending_past_window() {
        let conn = setup_db();
        // 23:30 + 60min runs past the 23:59 close
        let result = validate_slot(&conn, &hasan(), date("2026-09-10"), time("23:30"), 60).unwrap();
        assert!(matches!(result, Some(RejectReason::OutOfHours { .. })));
    }

    #[test]
    fn test_closed_day() {
        let conn = setup_db();
        // 2026-09-10 is a Thursday; this doctor only works Mon/Tue
        let result =
            validate_slot(&conn, &weekday_doctor(), date("2026-09-10"), time("10:00"), 60).unwrap();
        assert!(matches!(result, Some(RejectReason::ClosedDay { .. })));
    }

    #[test]
    fn test_overlapping_slot_rejected() {
        let conn = setup_db();
        assert!(matches!(
            commit(&conn, "Dr. Hasan Rahman", "2026-09-10", "15:30"),
            CommitOutcome::Committed(_)
        ));

        // 16:00 lands inside 15:30-16:30
        let result = validate_slot(&conn, &hasan(), date("2026-09-10"), time("16:00"), 60).unwrap();
        assert_eq!(result, Some(RejectReason::SlotTaken));

        // and so does a slot that ends inside it
        let result = validate_slot(&conn, &hasan(), date("2026-09-10"), time("15:00"), 60).unwrap();
        assert_eq!(result, Some(RejectReason::SlotTaken));
    }

    #[test]
    fn test_back_to_back_slots_do_not_conflict() {
        let conn = setup_db();
        assert!(matches!(
            commit(&conn, "Dr. Hasan Rahman", "2026-09-10", "15:30"),
            CommitOutcome::Committed(_)
        ));

        // starts exactly when the existing one ends
        let result = validate_slot(&conn, &hasan(), date("2026-09-10"), time("16:30"), 60).unwrap();
        assert_eq!(result, None);

        // ends exactly when the existing one starts
        let result = validate_slot(&conn, &hasan(), date("2026-09-10"), time("14:30"), 60).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_same_slot_different_doctor_is_fine() {
        let conn = setup_db();
        assert!(matches!(
            commit(&conn, "Dr. Hasan Rahman", "2026-09-10", "15:30"),
            CommitOutcome::Committed(_)
        ));

        let jesan = Roster::default_clinic()
            .get("Dr. Jesan Ahmed")
            .cloned()
            .unwrap();
        let result = validate_slot(&conn, &jesan, date("2026-09-10"), time("15:30"), 60).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let conn = setup_db();
        commit(&conn, "Dr. Hasan Rahman", "2026-09-10", "15:30");

        let first = validate_slot(&conn, &hasan(), date("2026-09-10"), time("15:30"), 60).unwrap();
        let second = validate_slot(&conn, &hasan(), date("2026-09-10"), time("15:30"), 60).unwrap();
        assert_eq!(first, second);

        let first = validate_slot(&conn, &hasan(), date("2026-09-10"), time("18:00"), 60).unwrap();
        let second = validate_slot(&conn, &hasan(), date("2026-09-10"), time("18:00"), 60).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_commit_recheck_catches_race() {
        let conn = setup_db();

        // Both callers validated the same free slot...
        let check = validate_slot(&conn, &hasan(), date("2026-09-10"), time("15:30"), 60).unwrap();
        assert_eq!(check, None);
        let check = validate_slot(&conn, &hasan(), date("2026-09-10"), time("15:30"), 60).unwrap();
        assert_eq!(check, None);

        // ...but only the first commit wins.
        assert!(matches!(
            commit(&conn, "Dr. Hasan Rahman", "2026-09-10", "15:30"),
            CommitOutcome::Committed(_)
        ));
        assert!(matches!(
            commit(&conn, "Dr. Hasan Rahman", "2026-09-10", "15:30"),
            CommitOutcome::Rejected(RejectReason::SlotTaken)
        ));
    }

    #[test]
    fn test_no_overlap_after_any_commit_sequence() {
        let conn = setup_db();
        let attempts = ["15:30", "16:00", "16:30", "15:30", "17:00", "16:45"];
        for t in attempts {
            let _ = commit(&conn, "Dr. Hasan Rahman", "2026-09-10", t);
        }

        let rows =
            queries::appointments_for_day(&conn, "Dr. Hasan Rahman", date("2026-09-10")).unwrap();
        for (i, a) in rows.iter().enumerate() {
            for b in rows.iter().skip(i + 1) {
                assert!(
                    a.ends_at() <= b.starts_at() || b.ends_at() <= a.starts_at(),
                    "{} and {} overlap",
                    a.time,
                    b.time
                );
            }
        }
    }

    #[test]
    fn test_commit_with_missing_fields_is_an_error() {
        let conn = setup_db();
        let mut booking = complete_booking("Dr. Hasan Rahman", "2026-09-10", "15:30");
        booking.phone = None;
        assert!(commit_appointment(&conn, &booking).is_err());
    }
}
