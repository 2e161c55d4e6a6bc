use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::booking::{Booking, BookingState, FieldUpdates, RejectReason};

const SESSION_TTL_MINUTES: i64 = 30;

/// Per-call booking session, keyed by the caller's call id. Created on the
/// first utterance, consumed on commit, discarded on hangup or expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    pub call_id: String,
    pub booking: Booking,
    pub state: BookingState,
    /// Doctor names awaiting a "did you mean X or Y" answer. While set, the
    /// disambiguation question outranks every other prompt.
    pub doctor_choices: Option<Vec<String>>,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl CallSession {
    pub fn new(call_id: &str) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            call_id: call_id.to_string(),
            booking: Booking::default(),
            state: BookingState::Collecting,
            doctor_choices: None,
            last_activity: now,
            expires_at: now + Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    pub fn touch(&mut self) {
        let now = Utc::now().naive_utc();
        self.last_activity = now;
        self.expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);
    }

    /// Applies one turn's worth of updates atomically. Any real value change
    /// drops a previous validation result, so a slot okayed for one doctor
    /// is never silently carried over to another doctor or another time.
    pub fn apply_updates(&mut self, updates: &FieldUpdates) {
        if updates.is_empty() {
            return;
        }
        let changed = self.booking.apply(updates);
        if changed || !matches!(self.state, BookingState::Validated) {
            self.state = if self.booking.is_complete() {
                BookingState::ReadyToValidate
            } else {
                BookingState::Collecting
            };
        }
    }

    /// Records a validation failure: the offending field is unset again so
    /// the caller is asked for an alternative.
    pub fn reject(&mut self, reason: RejectReason) {
        self.booking.clear(reason.field_to_clear());
        self.state = BookingState::Rejected(reason);
    }

    pub fn mark_validated(&mut self) {
        self.state = BookingState::Validated;
    }

    pub fn mark_committed(&mut self) {
        self.state = BookingState::Committed;
    }
}
