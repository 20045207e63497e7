//! The `resume_session` cookie that ties a `/predict` call to its `/results` read.

use axum::http::{header, HeaderMap};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "resume_session";

/// The caller's session id, if the request carries a well-formed one.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn session_cookie(id: &str, max_age_secs: u64) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax")
}
