//! Incremental HTTP/1.1 request decoding.

use crate::{
    errors::ErrorKind,
    http::{headers::HeaderTable, query::Query},
    limits::ReqLimits,
};
use memchr::memmem;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

const SEPARATOR: &[u8] = b"\r\n";

/// The parsed first line of an HTTP request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestLine {
    pub(crate) method: String,
    pub(crate) target: String,
    pub(crate) http_version: String,
}

impl RequestLine {
    /// The request method token, e.g. `GET`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The path component of the request target. Query parameters are split
    /// off into [`Request::query`].
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The protocol version; always `1.1`.
    pub fn http_version(&self) -> &str {
        &self.http_version
    }
}

/// A fully decoded HTTP request.
///
/// Built field-by-field by [`RequestDecoder`] and frozen once decoding
/// completes. [`path_params`](Request::path_params) stays empty until the
/// [`Router`](crate::Router) matches a route and binds its parameter
/// segments.
#[derive(Debug, PartialEq, Default)]
pub struct Request {
    pub(crate) request_line: RequestLine,
    pub(crate) headers: HeaderTable,
    pub(crate) body: Vec<u8>,
    pub(crate) path_params: HashMap<String, String>,
    pub(crate) query: Query,
}

impl Request {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The parsed request line.
    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    /// Shorthand for [`RequestLine::method`].
    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    /// Shorthand for [`RequestLine::target`]: the request path.
    pub fn path(&self) -> &str {
        &self.request_line.target
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    /// The request body. Empty unless a positive `Content-Length` was
    /// declared, in which case its length equals the declared length.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// A path parameter bound by the matched route pattern.
    ///
    /// For a route `/users/{id}`, `path_param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// All bound path parameters.
    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// The decoded query parameters.
    pub fn query(&self) -> &Query {
        &self.query
    }

    fn content_length(&self) -> Option<usize> {
        self.headers.get("content-length").and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Init,
    Headers,
    Body,
    Done,
    Error,
}

/// A resumable decoder turning an arbitrarily-chunked byte stream into a
/// [`Request`].
///
/// [`decode`](RequestDecoder::decode) can be fed any prefix of the request
/// and reports how many bytes it consumed; the caller keeps the unconsumed
/// suffix, appends newly read bytes after it, and calls again. No internal
/// I/O happens, which is what makes the state machine testable byte by
/// byte; [`from_reader`](RequestDecoder::from_reader) is the driving loop
/// over an actual stream.
///
/// # Examples
///
/// ```
/// use anvil_web::{limits::ReqLimits, RequestDecoder};
///
/// let raw = b"GET /x?q=1 HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
/// let mut decoder = RequestDecoder::new(&ReqLimits::default());
/// let consumed = decoder.decode(raw).unwrap();
///
/// assert_eq!(consumed, raw.len());
/// let request = decoder.into_request().unwrap();
/// assert_eq!(request.method(), "GET");
/// assert_eq!(request.path(), "/x");
/// assert_eq!(request.query().get("q"), Some("1"));
/// ```
#[derive(Debug)]
pub struct RequestDecoder {
    request: Request,
    state: ParseState,
    expected_body: usize,
    limits: ReqLimits,
}

impl RequestDecoder {
    /// Creates a decoder for a single request.
    pub fn new(limits: &ReqLimits) -> Self {
        Self {
            request: Request::new(),
            state: ParseState::Init,
            expected_body: 0,
            limits: limits.clone(),
        }
    }

    /// Advances the state machine over `buf` and returns how many bytes
    /// were consumed.
    ///
    /// Consuming fewer bytes than provided is normal: either the decoder is
    /// waiting for the rest of a line, or it reached
    /// [`is_done`](RequestDecoder::is_done) and the remainder belongs to
    /// whatever follows this request on the stream. Terminal states consume
    /// nothing.
    pub fn decode(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        let mut consumed = 0;

        loop {
            let rest = &buf[consumed..];
            if rest.is_empty() {
                break;
            }

            match self.state {
                ParseState::Init => match parse_request_line(rest) {
                    Ok(None) => break,
                    Ok(Some((request_line, query, n))) => {
                        self.request.request_line = request_line;
                        self.request.query = query;
                        consumed += n;
                        self.state = ParseState::Headers;
                    }
                    Err(err) => return self.fail(err),
                },

                ParseState::Headers => {
                    let (n, done) = match self.request.headers.parse(rest) {
                        Ok(parsed) => parsed,
                        Err(err) => return self.fail(err),
                    };
                    if self.request.headers.len() > self.limits.max_header_count {
                        return self.fail(ErrorKind::TooManyHeaders);
                    }
                    if n == 0 {
                        break;
                    }
                    consumed += n;

                    if done {
                        // Chunked framing is unsupported; refuse it here
                        // rather than misread the body as a fixed length.
                        if self.request.headers.get("transfer-encoding").is_some() {
                            return self.fail(ErrorKind::UnsupportedBodyEncoding);
                        }

                        match self.request.content_length() {
                            Some(length) if length > 0 => {
                                if length > self.limits.max_body_size {
                                    return self.fail(ErrorKind::BodyTooLarge);
                                }
                                self.expected_body = length;
                                self.state = ParseState::Body;
                            }
                            // Absent, zero, or unparsable: no body.
                            _ => self.state = ParseState::Done,
                        }
                    }
                }

                ParseState::Body => {
                    let remaining = (self.expected_body - self.request.body.len()).min(rest.len());
                    self.request.body.extend_from_slice(&rest[..remaining]);
                    consumed += remaining;

                    if self.request.body.len() == self.expected_body {
                        self.state = ParseState::Done;
                    }
                }

                ParseState::Done => break,

                ParseState::Error => return Err(ErrorKind::RequestInErrorState),
            }
        }

        Ok(consumed)
    }

    /// Returns `true` once the request is fully decoded.
    pub fn is_done(&self) -> bool {
        self.state == ParseState::Done
    }

    /// Returns the decoded request, or `None` if decoding has not reached
    /// its terminal state.
    pub fn into_request(self) -> Option<Request> {
        match self.state {
            ParseState::Done => Some(self.request),
            _ => None,
        }
    }

    fn fail(&mut self, err: ErrorKind) -> Result<usize, ErrorKind> {
        self.state = ParseState::Error;
        Err(err)
    }

    /// Decodes one request from `reader`, reading in
    /// [`read_chunk_size`](ReqLimits::read_chunk_size) chunks.
    ///
    /// Returns the request together with any bytes read past its end; those
    /// belong to a subsequent pipelined request and are preserved for the
    /// caller to deal with. End-of-stream before the request completes is
    /// [`ConnectionClosedEarly`](ErrorKind::ConnectionClosedEarly), distinct
    /// from a malformed request.
    pub async fn from_reader<R>(
        reader: &mut R,
        limits: &ReqLimits,
    ) -> Result<(Request, Vec<u8>), ErrorKind>
    where
        R: AsyncRead + Unpin,
    {
        let mut decoder = Self::new(limits);
        let mut pending = Vec::with_capacity(limits.read_chunk_size);
        let mut chunk = vec![0u8; limits.read_chunk_size];

        while !decoder.is_done() {
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                return Err(ErrorKind::ConnectionClosedEarly);
            }

            pending.extend_from_slice(&chunk[..n]);
            let consumed = decoder.decode(&pending)?;
            pending.drain(..consumed);
        }

        Ok((decoder.request, pending))
    }
}

/// Parses the request line at the front of `buf`, returning `Ok(None)`
/// until a full line is buffered.
fn parse_request_line(buf: &[u8]) -> Result<Option<(RequestLine, Query, usize)>, ErrorKind> {
    let Some(idx) = memmem::find(buf, SEPARATOR) else {
        return Ok(None);
    };

    let line =
        simdutf8::basic::from_utf8(&buf[..idx]).map_err(|_| ErrorKind::MalformedRequestLine)?;
    let consumed = idx + SEPARATOR.len();

    // Exactly three space-separated tokens.
    let mut tokens = line.split(' ');
    let (method, target, version) = match (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    {
        (Some(method), Some(target), Some(version), None)
            if !method.is_empty() && !target.is_empty() =>
        {
            (method, target, version)
        }
        _ => return Err(ErrorKind::MalformedRequestLine),
    };

    let http_version = version
        .strip_prefix("HTTP/")
        .filter(|v| *v == "1.1")
        .ok_or(ErrorKind::MalformedRequestLine)?;

    let (path, raw_query) = match target.split_once('?') {
        Some((path, raw_query)) => (path, Some(raw_query)),
        None => (target, None),
    };

    // A query string that fails to parse degrades to no parameters; it
    // never fails the request.
    let query = match raw_query {
        Some(raw) => Query::parse(raw).unwrap_or_default(),
        None => Query::default(),
    };

    let request_line = RequestLine {
        method: method.to_string(),
        target: path.to_string(),
        http_version: http_version.to_string(),
    };

    Ok(Some((request_line, query, consumed)))
}
