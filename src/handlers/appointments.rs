use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Appointment;
use crate::services::calendar;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DoctorSummary {
    pub name: String,
    pub aliases: Vec<String>,
    pub hours: String,
}

/// The roster as the frontend sees it, hours already human-readable.
pub async fn list_doctors(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let doctors: Vec<DoctorSummary> = state
        .roster
        .doctors
        .iter()
        .map(|d| DoctorSummary {
            name: d.name.clone(),
            aliases: d.aliases.clone(),
            hours: d.hours.to_human_readable(),
        })
        .collect();
    Json(serde_json::json!({ "doctors": doctors }))
}

#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub doctor: Option<String>,
    pub date: Option<String>,
}

/// Read-back of committed rows, optionally narrowed by doctor and/or day.
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = match query.date.as_deref() {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("invalid date: {raw}")))?,
        ),
        None => None,
    };

    let rows: Vec<Appointment> = {
        let db = state.db.lock().unwrap();
        queries::list_appointments(&db, query.doctor.as_deref(), date)
            .map_err(AppError::Internal)?
    };
    Ok(Json(serde_json::json!({ "rows": rows })))
}

pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let appointment = {
        let db = state.db.lock().unwrap();
        queries::get_appointment(&db, &id).map_err(AppError::Internal)?
    };

    let Some(appointment) = appointment else {
        return Err(AppError::NotFound(format!("appointment {id}")));
    };

    let ics = calendar::generate_ics(&appointment, &state.config.brand_name);
    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"appointment.ics\"",
            ),
        ],
        ics,
    )
        .into_response())
}
