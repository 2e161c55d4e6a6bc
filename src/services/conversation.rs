use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::models::{
    Booking, BookingState, CallSession, ExtractedFields, FieldUpdates, Resolution, Roster,
};
use crate::services::ai::extract::extract_fields;
use crate::services::scheduling::{self, CommitOutcome};
use crate::state::AppState;

const REPEAT_PROMPT: &str = "Sorry, could you repeat that?";
const PHONE_REPROMPT: &str = "Please say your phone number with at least 8 digits.";
const DATETIME_REPROMPT: &str = "Sorry, I couldn't understand that date and time.";
const RETRY_PROMPT: &str = "Sorry, I'm having trouble right now. Please try again in a moment.";

/// What goes back to the voice layer after one utterance: the text to speak
/// plus a snapshot of where the booking stands.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub reply: String,
    pub state: BookingState,
    pub booking: Booking,
}

/// Runs one turn of the booking dialogue for a call: extract fields from the
/// utterance, fold them into the session's booking, check the slot once all
/// six fields are present, and commit on an explicit yes.
pub async fn process_turn(
    state: &Arc<AppState>,
    call_id: &str,
    utterance: &str,
) -> anyhow::Result<TurnReply> {
    let mut session = take_session(state, call_id);

    let extracted = match extract_fields(
        state.llm.as_ref(),
        &state.roster.names(),
        &session.booking,
        utterance,
    )
    .await
    {
        Ok(fields) => fields,
        Err(e) => {
            // Extraction is side-effect free, so the caller repeating
            // themselves retries it with nothing lost.
            tracing::warn!(error = %e, call_id, "field extraction failed");
            return Ok(finish_turn(state, session, REPEAT_PROMPT.to_string()));
        }
    };

    tracing::info!(call_id, state = ?session.state, fields = ?extracted, "processing turn");

    let was_validated = session.state == BookingState::Validated;
    let (updates, correction) = sanitize(&state.roster, &mut session, &extracted);
    session.apply_updates(&updates);

    if session.state == BookingState::ReadyToValidate {
        if let Err(e) = run_validation(state, &mut session) {
            // Store unreachable: keep the booking as-is so the same check
            // can simply run again next turn.
            tracing::error!(error = %e, call_id, "slot check failed");
            return Ok(finish_turn(state, session, RETRY_PROMPT.to_string()));
        }
    }

    // A confirmation only counts against a slot the caller has already heard
    // proposed; anything revised this turn goes through validation first.
    if was_validated && session.state == BookingState::Validated && session.doctor_choices.is_none()
    {
        match extracted.confirm {
            Some(true) => return commit_validated(state, session),
            Some(false) => {
                return Ok(finish_turn(
                    state,
                    session,
                    "No problem. What would you like to change?".to_string(),
                ));
            }
            None => {}
        }
    }

    let reply = choose_reply(&session, correction);
    Ok(finish_turn(state, session, reply))
}

/// Drops a call's session without committing anything. Returns false when
/// there was nothing to drop.
pub fn end_call(state: &Arc<AppState>, call_id: &str) -> bool {
    let removed = state.sessions.lock().unwrap().remove(call_id);
    if let Some(session) = &removed {
        tracing::info!(call_id, state = ?session.state, "call ended, booking discarded");
    }
    removed.is_some()
}

fn commit_validated(state: &Arc<AppState>, mut session: CallSession) -> anyhow::Result<TurnReply> {
    let outcome = {
        // The lock is held across the re-check and the insert inside
        // commit_appointment, which is what serializes racing commits.
        let db = state.db.lock().unwrap();
        scheduling::commit_appointment(&db, &session.booking)
    };

    match outcome {
        Ok(CommitOutcome::Committed(appointment)) => {
            tracing::info!(
                call_id = %session.call_id,
                appointment_id = %appointment.id,
                doctor = %appointment.doctor,
                "appointment committed"
            );
            session.mark_committed();
            let reply = format!(
                "Booked with {} on {} at {}. See you then!",
                appointment.doctor,
                appointment.date,
                appointment.time.format("%H:%M"),
            );
            // The session is consumed by a successful commit.
            Ok(TurnReply {
                reply,
                state: BookingState::Committed,
                booking: session.booking,
            })
        }
        Ok(CommitOutcome::Rejected(reason)) => {
            // Another call took the slot between our check and this write.
            session.reject(reason);
            let reply = choose_reply(&session, None);
            Ok(finish_turn(state, session, reply))
        }
        Err(e) => {
            tracing::error!(error = %e, call_id = %session.call_id, "failed to write appointment");
            Ok(finish_turn(
                state,
                session,
                "I couldn't save the booking just now. Please say yes again in a moment."
                    .to_string(),
            ))
        }
    }
}

/// Turns raw extracted strings into typed, cleaned field updates. Values that
/// fail their checks are dropped and answered with a correction prompt
/// instead of ever reaching the booking.
fn sanitize(
    roster: &Roster,
    session: &mut CallSession,
    extracted: &ExtractedFields,
) -> (FieldUpdates, Option<String>) {
    let mut updates = FieldUpdates::default();
    let mut correction: Option<String> = None;

    if let Some(spoken) = extracted.doctor.as_deref() {
        match roster.resolve(spoken) {
            Resolution::Matched(name) => {
                session.doctor_choices = None;
                updates.doctor = Some(name);
            }
            Resolution::Ambiguous(candidates) => {
                session.doctor_choices = Some(candidates);
            }
            Resolution::NotFound => {
                correction = Some(format!(
                    "Sorry, that doctor is not in our clinic. Available doctors: {}. Which doctor would you like?",
                    roster.names().join(", ")
                ));
            }
        }
    }

    if let Some(name) = extracted.patient_name.as_deref() {
        let cleaned = clean_name(name);
        if !cleaned.is_empty() {
            updates.patient_name = Some(cleaned);
        }
    }

    if let Some(phone) = extracted.phone.as_deref() {
        match clean_phone(phone) {
            Some(digits) => updates.phone = Some(digits),
            None => {
                if correction.is_none() {
                    correction = Some(PHONE_REPROMPT.to_string());
                }
            }
        }
    }

    if let Some(service) = extracted.service.as_deref() {
        let trimmed = service.trim();
        if !trimmed.is_empty() {
            updates.service = Some(trimmed.to_string());
        }
    }

    if let Some(raw) = extracted.date.as_deref() {
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => updates.date = Some(date),
            Err(_) => {
                if correction.is_none() {
                    correction = Some(DATETIME_REPROMPT.to_string());
                }
            }
        }
    }

    if let Some(raw) = extracted.time.as_deref() {
        match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
            Ok(time) => updates.time = Some(time),
            Err(_) => {
                if correction.is_none() {
                    correction = Some(DATETIME_REPROMPT.to_string());
                }
            }
        }
    }

    updates.duration_minutes = extracted
        .duration_minutes
        .filter(|minutes| (1..=480).contains(minutes));

    (updates, correction)
}

fn run_validation(state: &Arc<AppState>, session: &mut CallSession) -> anyhow::Result<()> {
    let booking = &session.booking;
    let (Some(doctor_name), Some(date), Some(time)) =
        (booking.doctor.clone(), booking.date, booking.time)
    else {
        anyhow::bail!("slot check reached without a fully collected booking");
    };
    let Some(doctor) = state.roster.get(&doctor_name) else {
        anyhow::bail!("booking references a doctor missing from the roster: {doctor_name}");
    };

    let outcome = {
        let db = state.db.lock().unwrap();
        scheduling::validate_slot(&db, doctor, date, time, booking.duration())?
    };
    match outcome {
        None => session.mark_validated(),
        Some(reason) => session.reject(reason),
    }
    Ok(())
}

/// Deterministic prompt choice: a pending doctor disambiguation outranks
/// everything, then this turn's correction, then the session state.
fn choose_reply(session: &CallSession, correction: Option<String>) -> String {
    if let Some(candidates) = &session.doctor_choices {
        let first = candidates.first().map(String::as_str).unwrap_or("");
        let second = candidates.get(1).map(String::as_str).unwrap_or("");
        return format!("Did you mean {first} or {second}?");
    }
    if let Some(correction) = correction {
        return correction;
    }
    match &session.state {
        BookingState::Rejected(reason) => reason.to_string(),
        BookingState::Validated => confirmation_question(&session.booking),
        _ => session
            .booking
            .next_missing()
            .map(|field| field.question().to_string())
            .unwrap_or_else(|| confirmation_question(&session.booking)),
    }
}

fn confirmation_question(booking: &Booking) -> String {
    match (&booking.doctor, booking.date, booking.time) {
        (Some(doctor), Some(date), Some(time)) => format!(
            "Great, shall I book {doctor} on {date} at {}?",
            time.format("%H:%M")
        ),
        _ => "Great, shall I proceed to book this appointment?".to_string(),
    }
}

fn take_session(state: &Arc<AppState>, call_id: &str) -> CallSession {
    let mut sessions = state.sessions.lock().unwrap();
    let now = Utc::now().naive_utc();
    sessions.retain(|_, session| session.expires_at > now);
    sessions
        .remove(call_id)
        .unwrap_or_else(|| CallSession::new(call_id))
}

fn finish_turn(state: &Arc<AppState>, mut session: CallSession, reply: String) -> TurnReply {
    session.touch();
    let turn = TurnReply {
        reply,
        state: session.state.clone(),
        booking: session.booking.clone(),
    };
    state
        .sessions
        .lock()
        .unwrap()
        .insert(session.call_id.clone(), session);
    turn
}

/// Keep only letters, spaces and hyphens, then capitalize each word.
fn clean_name(s: &str) -> String {
    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ' || *c == '-')
        .collect();
    kept.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Digits only, and only accepted once at least 8 of them are present.
fn clean_phone(s: &str) -> Option<String> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits.len() >= 8).then_some(digits)
}
