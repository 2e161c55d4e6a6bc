pub mod appointment;
pub mod availability;
pub mod booking;
pub mod conversation;
pub mod extraction;
pub mod roster;

pub use appointment::{Appointment, AppointmentStatus};
pub use availability::WorkingHours;
pub use booking::{
    Booking, BookingField, BookingState, FieldUpdates, RejectReason, DEFAULT_DURATION_MINUTES,
};
pub use conversation::CallSession;
pub use extraction::ExtractedFields;
pub use roster::{Doctor, Resolution, Roster};
