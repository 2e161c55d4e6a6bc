use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::{Appointment, AppointmentStatus};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";
const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, doctor, patient_name, phone, service, date, time, duration_minutes, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            appointment.id,
            appointment.doctor,
            appointment.patient_name,
            appointment.phone,
            appointment.service,
            appointment.date.format(DATE_FMT).to_string(),
            appointment.time.format(TIME_FMT).to_string(),
            appointment.duration_minutes,
            appointment.status.as_str(),
            appointment.created_at.format(TIMESTAMP_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// One doctor's confirmed appointments for one day, ordered by start time.
pub fn appointments_for_day(
    conn: &Connection,
    doctor: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT id, doctor, patient_name, phone, service, date, time, duration_minutes, status, created_at
         FROM appointments
         WHERE doctor = ?1 AND date = ?2 AND status != 'cancelled'
         ORDER BY time ASC",
    )?;

    let rows = stmt.query_map(
        params![doctor, date.format(DATE_FMT).to_string()],
        |row| Ok(parse_appointment_row(row)),
    )?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn get_appointment(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        "SELECT id, doctor, patient_name, phone, service, date, time, duration_minutes, status, created_at
         FROM appointments WHERE id = ?1",
        params![id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appointment) => Ok(Some(appointment?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read-back over all doctors, optionally narrowed to one doctor and/or one
/// day, ordered by doctor then slot.
pub fn list_appointments(
    conn: &Connection,
    doctor: Option<&str>,
    date: Option<NaiveDate>,
) -> anyhow::Result<Vec<Appointment>> {
    let mut sql = String::from(
        "SELECT id, doctor, patient_name, phone, service, date, time, duration_minutes, status, created_at
         FROM appointments WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(doctor) = doctor {
        sql.push_str(&format!(" AND doctor = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(doctor.to_string()));
    }
    if let Some(date) = date {
        sql.push_str(&format!(" AND date = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(date.format(DATE_FMT).to_string()));
    }
    sql.push_str(" ORDER BY doctor ASC, date ASC, time ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

fn parse_appointment_row(row: &Row) -> rusqlite::Result<Appointment> {
    let date_str: String = row.get(5)?;
    let time_str: String = row.get(6)?;
    let status_str: String = row.get(8)?;
    let created_at_str: String = row.get(9)?;

    Ok(Appointment {
        id: row.get(0)?,
        doctor: row.get(1)?,
        patient_name: row.get(2)?,
        phone: row.get(3)?,
        service: row.get(4)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .unwrap_or_else(|_| Utc::now().date_naive()),
        time: NaiveTime::parse_from_str(&time_str, TIME_FMT)
            .unwrap_or_else(|_| NaiveTime::MIN),
        duration_minutes: row.get(7)?,
        status: AppointmentStatus::parse(&status_str),
        created_at: NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Booking;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn appointment(doctor: &str, date: &str, time: &str) -> Appointment {
        let mut booking = Booking::default();
        booking.doctor = Some(doctor.to_string());
        booking.patient_name = Some("Peter Griffin".to_string());
        booking.phone = Some("01553702359".to_string());
        booking.service = Some("Root canal".to_string());
        booking.date = NaiveDate::parse_from_str(date, DATE_FMT).ok();
        booking.time = NaiveTime::parse_from_str(time, TIME_FMT).ok();
        Appointment::from_booking(&booking).unwrap()
    }

    #[test]
    fn test_insert_then_read_back() {
        let conn = setup_db();
        let appt = appointment("Dr. Hasan Rahman", "2026-09-10", "15:30");
        insert_appointment(&conn, &appt).unwrap();

        let rows = appointments_for_day(
            &conn,
            "Dr. Hasan Rahman",
            NaiveDate::parse_from_str("2026-09-10", DATE_FMT).unwrap(),
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, appt.id);
        assert_eq!(rows[0].patient_name, "Peter Griffin");
        assert_eq!(rows[0].time, appt.time);
    }

    #[test]
    fn test_day_listing_is_partitioned_by_doctor() {
        let conn = setup_db();
        insert_appointment(&conn, &appointment("Dr. Hasan Rahman", "2026-09-10", "15:30"))
            .unwrap();
        insert_appointment(&conn, &appointment("Dr. Gregory House", "2026-09-10", "15:30"))
            .unwrap();

        let date = NaiveDate::parse_from_str("2026-09-10", DATE_FMT).unwrap();
        let rows = appointments_for_day(&conn, "Dr. Hasan Rahman", date).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].doctor, "Dr. Hasan Rahman");
    }

    #[test]
    fn test_day_listing_ordered_by_time() {
        let conn = setup_db();
        insert_appointment(&conn, &appointment("Dr. Hasan Rahman", "2026-09-10", "20:00"))
            .unwrap();
        insert_appointment(&conn, &appointment("Dr. Hasan Rahman", "2026-09-10", "14:00"))
            .unwrap();
        insert_appointment(&conn, &appointment("Dr. Hasan Rahman", "2026-09-10", "17:00"))
            .unwrap();

        let date = NaiveDate::parse_from_str("2026-09-10", DATE_FMT).unwrap();
        let rows = appointments_for_day(&conn, "Dr. Hasan Rahman", date).unwrap();
        let times: Vec<String> = rows
            .iter()
            .map(|a| a.time.format(TIME_FMT).to_string())
            .collect();
        assert_eq!(times, vec!["14:00", "17:00", "20:00"]);
    }

    #[test]
    fn test_get_appointment_by_id() {
        let conn = setup_db();
        let appt = appointment("Dr. Hasan Rahman", "2026-09-10", "15:30");
        insert_appointment(&conn, &appt).unwrap();

        assert!(get_appointment(&conn, &appt.id).unwrap().is_some());
        assert!(get_appointment(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_appointments_filters() {
        let conn = setup_db();
        insert_appointment(&conn, &appointment("Dr. Hasan Rahman", "2026-09-10", "15:30"))
            .unwrap();
        insert_appointment(&conn, &appointment("Dr. Hasan Rahman", "2026-09-11", "15:30"))
            .unwrap();
        insert_appointment(&conn, &appointment("Dr. Gregory House", "2026-09-10", "15:30"))
            .unwrap();

        assert_eq!(list_appointments(&conn, None, None).unwrap().len(), 3);
        assert_eq!(
            list_appointments(&conn, Some("Dr. Hasan Rahman"), None)
                .unwrap()
                .len(),
            2
        );
        let date = NaiveDate::parse_from_str("2026-09-10", DATE_FMT).unwrap();
        assert_eq!(list_appointments(&conn, None, Some(date)).unwrap().len(), 2);
        assert_eq!(
            list_appointments(&conn, Some("Dr. Gregory House"), Some(date))
                .unwrap()
                .len(),
            1
        );
    }
}
