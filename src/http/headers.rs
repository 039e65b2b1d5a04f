//! Case-insensitive, insertion-ordered header collection

use crate::errors::ErrorKind;
use memchr::{memchr, memmem};

const SEPARATOR: &[u8] = b"\r\n";

/// An ordered collection of HTTP header fields.
///
/// Names are compared case-insensitively and stored normalized to
/// lower-case, so the table never holds two entries that differ only by
/// case. Insertion order is preserved and is the order
/// [`iter`](HeaderTable::iter) (and therefore the response serializer)
/// exposes.
///
/// Setting a name that already exists appends to its value as a
/// comma-joined list, per HTTP semantics for combinable fields; use
/// [`replace`](HeaderTable::replace) to overwrite.
///
/// # Examples
///
/// ```
/// use anvil_web::HeaderTable;
///
/// let mut headers = HeaderTable::new();
/// headers.set("Accept", "text/html");
/// headers.set("ACCEPT", "application/json");
///
/// assert_eq!(headers.get("accept"), Some("text/html, application/json"));
///
/// headers.replace("accept", "*/*");
/// assert_eq!(headers.get("Accept"), Some("*/*"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderTable {
    entries: Vec<(String, String)>,
}

impl HeaderTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `name`, matching case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Inserts a header, appending `", value"` if the name is already
    /// present.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.position(name) {
            Some(i) => {
                let existing = &mut self.entries[i].1;
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => self.entries.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Inserts a header, overwriting any existing value unconditionally.
    pub fn replace(&mut self, name: &str, value: &str) {
        match self.position(name) {
            Some(i) => self.entries[i].1 = value.to_string(),
            None => self.entries.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Removes a header if present.
    pub fn delete(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs in insertion order. Names are the
    /// stored lower-case form.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

// Streaming parser
impl HeaderTable {
    /// Consumes complete header lines from the front of `buf`.
    ///
    /// Returns `(bytes_consumed, headers_complete)`. A buffer ending in a
    /// partial line consumes only the complete lines before it; the caller
    /// drains what was consumed and retries with the rest once more bytes
    /// arrive. The empty line terminating the header section is consumed
    /// and reported via the flag.
    pub fn parse(&mut self, buf: &[u8]) -> Result<(usize, bool), ErrorKind> {
        let mut consumed = 0;

        loop {
            let rest = &buf[consumed..];
            let Some(idx) = memmem::find(rest, SEPARATOR) else {
                return Ok((consumed, false));
            };

            // Terminator at the front is the end of the header section.
            if idx == 0 {
                consumed += SEPARATOR.len();
                return Ok((consumed, true));
            }

            let line = &rest[..idx];
            let colon = memchr(b':', line).ok_or(ErrorKind::MalformedHeaderName)?;

            let name = &line[..colon];
            if name.is_empty() || !name.iter().all(|&b| is_token_char(b)) {
                return Err(ErrorKind::MalformedHeaderName);
            }

            // Names are token chars only, so they are valid ASCII; values
            // may carry anything and are taken lossily.
            let name = std::str::from_utf8(name).map_err(|_| ErrorKind::MalformedHeaderName)?;
            let value = String::from_utf8_lossy(&line[colon + 1..]);
            self.set(name, value.trim());

            consumed += idx + SEPARATOR.len();
        }
    }
}

/// Field-name token characters per
/// [RFC 9110, Section 5.6.2](https://datatracker.ietf.org/doc/html/rfc9110#section-5.6.2).
const fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_lookup() {
        let mut headers = HeaderTable::new();
        headers.set("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-length"), None);
    }

    #[test]
    fn set_appends_comma_joined() {
        let mut headers = HeaderTable::new();
        headers.set("Trailer", "X-Content-SHA256");
        headers.set("Trailer", "X-Content-Length");

        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.get("trailer"),
            Some("X-Content-SHA256, X-Content-Length")
        );
    }

    #[test]
    fn replace_overwrites() {
        let mut headers = HeaderTable::new();
        headers.set("Content-Type", "text/plain");
        headers.set("content-type", "text/html");
        headers.replace("CONTENT-TYPE", "application/json");

        assert_eq!(headers.get("content-type"), Some("application/json"));
    }

    #[test]
    fn delete_removes() {
        let mut headers = HeaderTable::new();
        headers.set("Content-Length", "0");
        headers.delete("content-length");

        assert_eq!(headers.get("Content-Length"), None);
        assert!(headers.is_empty());
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut headers = HeaderTable::new();
        headers.set("Content-Length", "5");
        headers.set("Connection", "close");
        headers.set("Content-Type", "text/plain");

        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["content-length", "connection", "content-type"]);
    }

    #[test]
    fn parse_single_line() {
        let mut headers = HeaderTable::new();
        let (n, done) = headers.parse(b"Host: localhost:42069\r\n\r\n").unwrap();

        assert_eq!(n, 25);
        assert!(done);
        assert_eq!(headers.get("host"), Some("localhost:42069"));
    }

    #[test]
    fn parse_partial_line_consumes_nothing() {
        let mut headers = HeaderTable::new();
        let (n, done) = headers.parse(b"Host: loc").unwrap();

        assert_eq!(n, 0);
        assert!(!done);
        assert!(headers.is_empty());
    }

    #[test]
    fn parse_resumes_after_more_bytes_arrive() {
        let mut headers = HeaderTable::new();
        let mut pending = b"Host: localhost\r\nUser-Ag".to_vec();

        let (n, done) = headers.parse(&pending).unwrap();
        assert_eq!(n, 17);
        assert!(!done);
        pending.drain(..n);

        pending.extend_from_slice(b"ent: curl/7.81.0\r\n\r\n");
        let (n, done) = headers.parse(&pending).unwrap();
        assert_eq!(n, pending.len());
        assert!(done);

        assert_eq!(headers.get("host"), Some("localhost"));
        assert_eq!(headers.get("user-agent"), Some("curl/7.81.0"));
    }

    #[test]
    fn parse_trims_value_whitespace() {
        #[rustfmt::skip]
        let cases = [
            ("Name: value\r\n\r\n",      Some("value")),
            ("Name:value\r\n\r\n",       Some("value")),
            ("Name:   value  \r\n\r\n",  Some("value")),
            ("Name:\r\n\r\n",            Some("")),
            ("Name: \r\n\r\n",           Some("")),
        ];

        for (raw, expected) in cases {
            let mut headers = HeaderTable::new();
            let (n, done) = headers.parse(raw.as_bytes()).unwrap();

            assert_eq!(n, raw.len());
            assert!(done);
            assert_eq!(headers.get("name"), expected, "case: {raw:?}");
        }
    }

    #[test]
    fn parse_rejects_invalid_names() {
        #[rustfmt::skip]
        let cases: [&[u8]; 5] = [
            b"Host : localhost\r\n",   // space before the colon
            b"Ho st: localhost\r\n",   // space inside the name
            b": localhost\r\n",        // empty name
            b"H\x7fst: localhost\r\n", // non-token byte
            b"NoColonHere\r\n",        // not a header field at all
        ];

        for raw in cases {
            let mut headers = HeaderTable::new();
            assert_eq!(
                headers.parse(raw),
                Err(ErrorKind::MalformedHeaderName),
                "case: {raw:?}"
            );
        }
    }

    #[test]
    fn parse_accepts_token_names() {
        let mut headers = HeaderTable::new();
        let (_, done) = headers
            .parse(b"X-Custom.Header_1!: ok\r\n\r\n")
            .unwrap();

        assert!(done);
        assert_eq!(headers.get("x-custom.header_1!"), Some("ok"));
    }

    #[test]
    fn parse_stops_at_section_end() {
        let mut headers = HeaderTable::new();
        let raw = b"Content-Length: 5\r\n\r\nhello";
        let (n, done) = headers.parse(raw).unwrap();

        assert_eq!(n, raw.len() - 5);
        assert!(done);
        assert_eq!(headers.get("content-length"), Some("5"));
    }

    #[test]
    fn parse_duplicate_names_combine() {
        let mut headers = HeaderTable::new();
        let (_, done) = headers
            .parse(b"Accept: text/html\r\nACCEPT: application/json\r\n\r\n")
            .unwrap();

        assert!(done);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("accept"), Some("text/html, application/json"));
    }
}
