use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// The six facts a caller must supply before an appointment can be checked
/// and written. Order here is the order the caller is asked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingField {
    Doctor,
    PatientName,
    Phone,
    Service,
    Date,
    Time,
}

impl BookingField {
    pub const ASK_ORDER: [BookingField; 6] = [
        BookingField::Doctor,
        BookingField::PatientName,
        BookingField::Phone,
        BookingField::Service,
        BookingField::Date,
        BookingField::Time,
    ];

    pub fn question(&self) -> &'static str {
        match self {
            BookingField::Doctor => "Which doctor would you like to book with?",
            BookingField::PatientName => "What is your name?",
            BookingField::Phone => {
                "What is your phone number? Please say at least 8 digits."
            }
            BookingField::Service => "What service do you need?",
            BookingField::Date => "What date would you like to schedule your appointment?",
            BookingField::Time => "What time would you like to schedule your appointment?",
        }
    }
}

/// Why a fully specified slot was turned down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ClosedDay { hours: String },
    OutOfHours { hours: String },
    SlotTaken,
}

impl RejectReason {
    /// The field the caller has to re-supply after this rejection.
    pub fn field_to_clear(&self) -> BookingField {
        match self {
            RejectReason::ClosedDay { .. } => BookingField::Date,
            RejectReason::OutOfHours { .. } | RejectReason::SlotTaken => BookingField::Time,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ClosedDay { hours } => {
                write!(
                    f,
                    "The clinic is closed that day. The doctor is available {hours}. What other date works for you?"
                )
            }
            RejectReason::OutOfHours { hours } => {
                write!(
                    f,
                    "That time is outside the doctor's hours. We're available {hours}. Please choose a time in that range."
                )
            }
            RejectReason::SlotTaken => {
                write!(
                    f,
                    "That time is already booked. Please choose another time or another date."
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    Collecting,
    ReadyToValidate,
    Validated,
    Committed,
    Rejected(RejectReason),
}

/// One in-progress booking. Fields start unset and are filled turn by turn;
/// a later value for an already-set field is a correction and overwrites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Booking {
    pub doctor: Option<String>,
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
}

/// Typed field values extracted from one utterance. Unset members mean "the
/// caller said nothing about this field this turn".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    pub doctor: Option<String>,
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
}

impl FieldUpdates {
    pub fn is_empty(&self) -> bool {
        *self == FieldUpdates::default()
    }
}

impl Booking {
    pub fn is_set(&self, field: BookingField) -> bool {
        match field {
            BookingField::Doctor => self.doctor.is_some(),
            BookingField::PatientName => self.patient_name.is_some(),
            BookingField::Phone => self.phone.is_some(),
            BookingField::Service => self.service.is_some(),
            BookingField::Date => self.date.is_some(),
            BookingField::Time => self.time.is_some(),
        }
    }

    pub fn clear(&mut self, field: BookingField) {
        match field {
            BookingField::Doctor => self.doctor = None,
            BookingField::PatientName => self.patient_name = None,
            BookingField::Phone => self.phone = None,
            BookingField::Service => self.service = None,
            BookingField::Date => self.date = None,
            BookingField::Time => self.time = None,
        }
    }

    pub fn missing_fields(&self) -> Vec<BookingField> {
        BookingField::ASK_ORDER
            .iter()
            .copied()
            .filter(|f| !self.is_set(*f))
            .collect()
    }

    pub fn next_missing(&self) -> Option<BookingField> {
        self.missing_fields().into_iter().next()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn duration(&self) -> i64 {
        self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    /// Applies all of a turn's updates at once and reports whether any field
    /// actually changed value. A repeated identical value is not a change.
    pub fn apply(&mut self, updates: &FieldUpdates) -> bool {
        let mut changed = false;
        if let Some(doctor) = &updates.doctor {
            changed |= self.doctor.as_ref() != Some(doctor);
            self.doctor = Some(doctor.clone());
        }
        if let Some(name) = &updates.patient_name {
            changed |= self.patient_name.as_ref() != Some(name);
            self.patient_name = Some(name.clone());
        }
        if let Some(phone) = &updates.phone {
            changed |= self.phone.as_ref() != Some(phone);
            self.phone = Some(phone.clone());
        }
        if let Some(service) = &updates.service {
            changed |= self.service.as_ref() != Some(service);
            self.service = Some(service.clone());
        }
        if let Some(date) = updates.date {
            changed |= self.date != Some(date);
            self.date = Some(date);
        }
        if let Some(time) = updates.time {
            changed |= self.time != Some(time);
            self.time = Some(time);
        }
        if let Some(minutes) = updates.duration_minutes {
            changed |= self.duration_minutes != Some(minutes);
            self.duration_minutes = Some(minutes);
        }
        changed
    }
}
