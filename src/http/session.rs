//! Navigation history and preference endpoints

use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::http::error::AppError;
use crate::session::Preferences;

/// Header carrying the browser tab's session id
pub const SESSION_HEADER: &str = "x-session-id";

pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn require_session(headers: &HeaderMap) -> Result<String, AppError> {
    session_id(headers).ok_or_else(|| AppError::BadRequest("Missing session id".to_string()))
}

#[derive(Serialize)]
pub struct HistoryResponse {
    entries: Vec<String>,
    current: Option<String>,
}

#[derive(Deserialize)]
pub struct VisitRequest {
    path: String,
}

#[derive(Serialize)]
pub struct BackResponse {
    path: Option<String>,
}

pub async fn get_history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, AppError> {
    let session = require_session(&headers)?;
    let history = state.sessions.history(&session);

    Ok(Json(HistoryResponse {
        current: history.current().map(str::to_string),
        entries: history.entries(),
    }))
}

pub async fn push_history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VisitRequest>,
) -> Result<Json<HistoryResponse>, AppError> {
    let session = require_session(&headers)?;
    if !req.path.starts_with('/') {
        return Err(AppError::BadRequest("Path must start with '/'".to_string()));
    }

    let history = state.sessions.visit(&session, &req.path);

    Ok(Json(HistoryResponse {
        current: history.current().map(str::to_string),
        entries: history.entries(),
    }))
}

pub async fn back_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BackResponse>, AppError> {
    let session = require_session(&headers)?;
    Ok(Json(BackResponse {
        path: state.sessions.back(&session),
    }))
}

pub async fn get_preferences_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Preferences>, AppError> {
    let session = require_session(&headers)?;
    Ok(Json(state.sessions.preferences(&session)))
}

pub async fn put_preferences_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(preferences): Json<Preferences>,
) -> Result<Json<Preferences>, AppError> {
    let session = require_session(&headers)?;
    state.sessions.set_preferences(&session, preferences);
    Ok(Json(preferences))
}
