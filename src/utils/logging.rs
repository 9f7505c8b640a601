//! Logging helpers for outbound calls.

use serde::Serialize;

/// Render `value` as indented JSON for `log`; skipped unless DEBUG is enabled.
pub(crate) fn debug_json<T: Serialize>(value: &T, log: impl FnOnce(&str)) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let rendered = serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<unserializable: {error}>"));
    log(&rendered);
}

/// At most `max_chars` characters of a response body, lossily decoded.
pub(crate) fn body_preview(bytes: &[u8], max_chars: usize) -> String {
    String::from_utf8_lossy(bytes).chars().take(max_chars).collect()
}
