//! Liveness probe.

/// Returns a fixed plain-text greeting.
///
/// ```ignore
/// GET / HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: text/plain; charset=utf-8
///
/// Hello, world!
/// ```
pub async fn health_handler() -> &'static str {
    "Hello, world!"
}
