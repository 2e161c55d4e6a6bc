use crate::models::Appointment;

pub fn generate_ics(appointment: &Appointment, brand_name: &str) -> String {
    let dtstart = appointment.starts_at().format("%Y%m%dT%H%M%S").to_string();
    let dtend = appointment.ends_at().format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = appointment.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@frontdesk", appointment.id);

    let summary = format!("{} with {}", appointment.service, appointment.doctor);
    let description = format!("{} at {}", appointment.patient_name, brand_name);

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Frontdesk//Booking Agent//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Booking;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_generate_ics() {
        let mut booking = Booking::default();
        booking.doctor = Some("Dr. Hasan Rahman".to_string());
        booking.patient_name = Some("Peter Griffin".to_string());
        booking.phone = Some("01553702359".to_string());
        booking.service = Some("Root canal".to_string());
        booking.date = NaiveDate::parse_from_str("2026-09-10", "%Y-%m-%d").ok();
        booking.time = NaiveTime::parse_from_str("15:30", "%H:%M").ok();
        let appointment = Appointment::from_booking(&booking).unwrap();

        let ics = generate_ics(&appointment, "Demo Dental Clinic");
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("DTSTART:20260910T153000"));
        assert!(ics.contains("DTEND:20260910T163000"));
        assert!(ics.contains("SUMMARY:Root canal with Dr. Hasan Rahman"));
        assert!(ics.contains("DESCRIPTION:Peter Griffin at Demo Dental Clinic"));
        assert!(ics.contains(&format!("UID:{}@frontdesk", appointment.id)));
        assert!(ics.contains("END:VCALENDAR"));
    }
}
