//! Maps failed responses onto [`ConsoleError`] values.
//!
//! The server sometimes answers with an HTML error page instead of a JSON
//! envelope. Those bodies are classified by scanning for a few well-known
//! substrings; everything about that heuristic lives here so it can be
//! swapped for structured error codes once the server provides them.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::ConsoleError;

pub const CSRF_MESSAGE: &str =
    "Security token is missing or expired. Refresh the page and try again.";
pub const ACCESS_DENIED_MESSAGE: &str =
    "Access denied (403). You do not have permission to perform this action.";
pub const NOT_FOUND_MESSAGE: &str = "Not found (404). The backup may have been removed.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error (500). Please try again later.";

const NETWORK_MARKERS: &[&str] = &[
    "network",
    "failed to fetch",
    "timed out",
    "timeout",
    "connection",
    "error sending request",
];

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Classify a non-2xx response.
///
/// A JSON body carrying a message wins; otherwise the status code and then
/// the raw text decide. Never fails: unmatched bodies get a generic message.
pub fn classify_failure(status: StatusCode, body: &str) -> ConsoleError {
    let code = Some(status.as_u16());

    if let Some(message) = json_message(body) {
        if status == StatusCode::FORBIDDEN && mentions_csrf(&message) {
            return ConsoleError::authorization(CSRF_MESSAGE);
        }
        return ConsoleError::transport(code, message);
    }

    if mentions_csrf(body) {
        return ConsoleError::authorization(CSRF_MESSAGE);
    }

    match status {
        StatusCode::FORBIDDEN => ConsoleError::transport(code, ACCESS_DENIED_MESSAGE),
        StatusCode::NOT_FOUND => ConsoleError::transport(code, NOT_FOUND_MESSAGE),
        status if status.is_server_error() => ConsoleError::transport(code, SERVER_ERROR_MESSAGE),
        _ => classify_text(code, body),
    }
}

/// Best-effort reading of an unstructured error body.
pub fn classify_text(status: Option<u16>, body: &str) -> ConsoleError {
    if mentions_csrf(body) {
        ConsoleError::authorization(CSRF_MESSAGE)
    } else if body.contains("403") {
        ConsoleError::transport(status, ACCESS_DENIED_MESSAGE)
    } else if body.contains("500") {
        ConsoleError::transport(status, SERVER_ERROR_MESSAGE)
    } else {
        let message = match status {
            Some(code) => format!("Request failed (HTTP {code})."),
            None => "Request failed. Please try again.".to_string(),
        };
        ConsoleError::transport(status, message)
    }
}

/// Whether an error text points at a connectivity problem rather than a
/// server-side refusal.
pub fn looks_like_network_failure(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    NETWORK_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn json_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|message| !message.trim().is_empty())
}

fn mentions_csrf(text: &str) -> bool {
    text.contains("CSRF")
}
