//! Classification of raw provider output.

/// Whether a provider's textual result signals a failure.
///
/// Providers report errors inline (`{"error": ...}`, `Error: ...`), so any
/// occurrence of `error` or `Error` marks the result as failed.
pub fn carries_error_marker(text: &str) -> bool {
    text.contains("error") || text.contains("Error")
}
