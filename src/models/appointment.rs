use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::booking::Booking;

/// A committed appointment row. Immutable once written; one row per slot,
/// partitioned by doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub doctor: String,
    pub patient_name: String,
    pub phone: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cancelled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Confirmed,
        }
    }
}

impl Appointment {
    /// Builds the committed row from a fully collected booking. Returns None
    /// while any field is still missing; callers gate on the session state,
    /// so a None here is a state-machine invariant violation.
    pub fn from_booking(booking: &Booking) -> Option<Self> {
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            doctor: booking.doctor.clone()?,
            patient_name: booking.patient_name.clone()?,
            phone: booking.phone.clone()?,
            service: booking.service.clone()?,
            date: booking.date?,
            time: booking.time?,
            duration_minutes: booking.duration(),
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now().naive_utc(),
        })
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at() + Duration::minutes(self.duration_minutes)
    }
}
