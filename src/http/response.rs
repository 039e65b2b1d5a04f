//! Buffer-backed HTTP response writing.

use crate::{http::headers::HeaderTable, StatusCode};
use serde::Serialize;

/// A sequential HTTP response writer.
///
/// The response is assembled into an owned buffer which the connection
/// layer flushes to the socket after the handler returns; handlers never
/// touch the stream directly.
///
/// The three sections must be written in order, each of the first two
/// exactly once:
/// [`write_status_line`](ResponseWriter::write_status_line), then
/// [`write_headers`](ResponseWriter::write_headers), then any number of
/// [`write_body`](ResponseWriter::write_body) calls. The order is checked
/// with `debug_assert!`; a release build that violates it produces a
/// malformed response on the wire.
///
/// # Examples
///
/// ```
/// use anvil_web::{ResponseWriter, StatusCode};
///
/// let mut w = ResponseWriter::new();
/// let body = b"Hello world";
///
/// w.write_status_line(StatusCode::Ok)
///     .write_headers(&ResponseWriter::default_headers(body.len()));
/// w.write_body(body);
/// ```
#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Vec<u8>,
    status: Option<StatusCode>,
    state: WriterState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WriterState {
    StatusLine,
    Headers,
    Body,
}

impl ResponseWriter {
    /// Creates a writer with an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(256),
            status: None,
            state: WriterState::StatusLine,
        }
    }

    /// Returns the headers every response starts from: `Content-Length`,
    /// `Connection: close`, and `Content-Type: text/plain`. Handlers
    /// [`replace`](HeaderTable::replace) what they need to override.
    pub fn default_headers(content_length: usize) -> HeaderTable {
        let mut headers = HeaderTable::new();
        headers.set("Content-Length", &content_length.to_string());
        headers.set("Connection", "close");
        headers.set("Content-Type", "text/plain");
        headers
    }

    /// Writes the status line. Must be the first write, exactly once.
    #[track_caller]
    pub fn write_status_line(&mut self, status: StatusCode) -> &mut Self {
        debug_assert!(
            self.state == WriterState::StatusLine,
            "status line must be written first and only once"
        );

        self.buffer.extend_from_slice(status.status_line());
        self.status = Some(status);
        self.state = WriterState::Headers;
        self
    }

    /// Writes the header block in table insertion order, followed by the
    /// blank separator line. Must follow the status line, exactly once.
    #[track_caller]
    pub fn write_headers(&mut self, headers: &HeaderTable) -> &mut Self {
        debug_assert!(
            self.state == WriterState::Headers,
            "headers must follow the status line and be written only once"
        );

        for (name, value) in headers.iter() {
            self.buffer.extend_from_slice(name.as_bytes());
            self.buffer.extend_from_slice(b": ");
            self.buffer.extend_from_slice(value.as_bytes());
            self.buffer.extend_from_slice(b"\r\n");
        }
        self.buffer.extend_from_slice(b"\r\n");
        self.state = WriterState::Body;
        self
    }

    /// Appends body bytes and returns how many were written. May be called
    /// any number of times after the header block.
    #[track_caller]
    pub fn write_body(&mut self, body: &[u8]) -> usize {
        debug_assert!(
            self.state == WriterState::Body,
            "body must follow the header block"
        );

        self.buffer.extend_from_slice(body);
        body.len()
    }

    /// The status line written so far, if any. Middleware uses this to log
    /// the outcome of the wrapped handler.
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub(crate) fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

// One-call helpers
impl ResponseWriter {
    /// Writes a complete plain-text response: status line, default
    /// headers sized for `body`, and the body itself.
    pub fn respond(&mut self, status: StatusCode, body: &[u8]) {
        self.write_status_line(status)
            .write_headers(&Self::default_headers(body.len()));
        self.write_body(body);
    }

    /// Serializes `value` to JSON and writes a complete response with
    /// `Content-Type: application/json`.
    ///
    /// A value that fails to serialize is a server-side problem; the
    /// response becomes an empty `500 Internal Server Error` instead.
    pub fn json<T: Serialize>(&mut self, status: StatusCode, value: &T) {
        let body = match serde_json::to_vec(value) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize response body");
                self.respond(StatusCode::InternalServerError, b"");
                return;
            }
        };

        let mut headers = Self::default_headers(body.len());
        headers.replace("Content-Type", "application/json");

        self.write_status_line(status).write_headers(&headers);
        self.write_body(&body);
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let mut w = ResponseWriter::new();
        let body = b"hello";

        w.write_status_line(StatusCode::Ok)
            .write_headers(&ResponseWriter::default_headers(body.len()));
        let written = w.write_body(body);

        assert_eq!(written, 5);
        assert_eq!(
            w.buffer(),
            b"HTTP/1.1 200 OK\r\n\
              content-length: 5\r\n\
              connection: close\r\n\
              content-type: text/plain\r\n\
              \r\n\
              hello" as &[u8]
        );
    }

    #[test]
    fn body_may_be_written_in_pieces() {
        let mut w = ResponseWriter::new();

        w.write_status_line(StatusCode::Ok)
            .write_headers(&ResponseWriter::default_headers(10));
        w.write_body(b"hello ");
        w.write_body(b"world");

        assert!(w.buffer().ends_with(b"\r\nhello world"));
    }

    #[test]
    fn overridden_default_headers() {
        let mut w = ResponseWriter::new();
        let mut headers = ResponseWriter::default_headers(2);
        headers.replace("Content-Type", "application/json");

        w.write_status_line(StatusCode::Created).write_headers(&headers);
        w.write_body(b"{}");

        let text = String::from_utf8(w.buffer().to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(text.contains("content-type: application/json\r\n"));
        assert!(!text.contains("text/plain"));
    }

    #[test]
    fn respond_writes_everything() {
        let mut w = ResponseWriter::new();
        w.respond(StatusCode::NotFound, b"404 Not Found");

        assert_eq!(w.status(), Some(StatusCode::NotFound));
        let text = String::from_utf8(w.buffer().to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("content-length: 13\r\n"));
        assert!(text.ends_with("\r\n404 Not Found"));
    }

    #[test]
    fn json_sets_content_type_and_length() {
        let mut w = ResponseWriter::new();
        w.json(StatusCode::Ok, &serde_json::json!({ "id": 123 }));

        let text = String::from_utf8(w.buffer().to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("content-type: application/json\r\n"));
        assert!(text.ends_with("\r\n{\"id\":123}"));
        assert!(text.contains("content-length: 10\r\n"));
    }

    #[test]
    #[should_panic(expected = "status line must be written first")]
    fn out_of_order_writes_are_caught() {
        let mut w = ResponseWriter::new();
        w.write_status_line(StatusCode::Ok)
            .write_headers(&ResponseWriter::default_headers(0));
        w.write_status_line(StatusCode::Ok);
    }
}
