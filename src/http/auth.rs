use axum::http::{header, HeaderMap};
use tracing::warn;

use super::AppState;
use crate::content::AdminError;

/// Compare two byte strings in time independent of where they differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim())
}

/// Reject the request unless it carries the configured admin token.
pub(super) fn require_admin<S>(state: &AppState<S>, headers: &HeaderMap) -> Result<(), AdminError> {
    let Some(expected) = state.admin_token.as_deref() else {
        warn!("admin write rejected: no admin token configured");
        return Err(AdminError::Unauthorized(
            "admin writes are disabled on this server".into(),
        ));
    };
    match bearer_token(headers) {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        Some(_) => {
            warn!("admin write rejected: wrong token");
            Err(AdminError::Unauthorized("invalid admin token".into()))
        }
        None => Err(AdminError::Unauthorized("missing bearer token".into())),
    }
}
