//! `Authorization: Bearer` header handling

use axum::http::{HeaderMap, header};

/// Token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively; surrounding whitespace is
/// trimmed and an empty token counts as absent.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
