//! Helpers for sanitizing data before it enters tracing span attributes
//! and log lines.
//!
//! Storage paths embed a random token and the client's original filename;
//! service error bodies may echo request payloads. Neither belongs in logs
//! verbatim.

/// Maximum length for sanitized error bodies to prevent log flooding.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Returns only the filename component of a storage path (no prefix),
/// with the leading upload token removed.
///
/// - `client-intake/4b1c…-card.jpg` → `card.jpg`
/// - `card.jpg` → `card.jpg`
pub fn redact_storage_path(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    if name.is_empty() {
        return "<unknown>".to_string();
    }

    // Upload names are `<uuid>-<original>`; a hyphenated UUID is 36 chars.
    match name.get(36..) {
        Some(rest) if rest.starts_with('-') && uuid::Uuid::parse_str(&name[..36]).is_ok() => {
            rest[1..].to_string()
        }
        _ => name.to_string(),
    }
}

/// Truncates a remote error body to a reasonable length for logging.
pub fn truncate_error_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }

    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}
