use crate::StatusCode;
use std::{error, fmt, io};

/// Reasons a request can fail before it ever reaches a handler.
///
/// Everything here is fatal to the request: the connection receives the
/// canned response from [`status`](ErrorKind::status) (when one applies)
/// and is closed.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The request line did not split into exactly three tokens, or the
    /// version token was not `HTTP/1.1`.
    MalformedRequestLine,
    /// A header line had no colon, or its name contained a non-token
    /// character.
    MalformedHeaderName,
    /// More distinct header names than [`ReqLimits::max_header_count`](crate::limits::ReqLimits).
    TooManyHeaders,
    /// Declared `Content-Length` above [`ReqLimits::max_body_size`](crate::limits::ReqLimits).
    BodyTooLarge,
    /// The request carries a `Transfer-Encoding` header. Chunked bodies are
    /// not supported; only `Content-Length` framing is.
    UnsupportedBodyEncoding,
    /// [`decode`](crate::RequestDecoder::decode) was called again after a
    /// previous call already failed.
    RequestInErrorState,
    /// The byte source reached end-of-stream before the request was
    /// completely decoded.
    ConnectionClosedEarly,
    /// A read or write on the underlying stream failed.
    Io(IoError),
}

impl ErrorKind {
    /// The status to put on the wire for this failure. `None` when the peer
    /// is already gone and no response should be attempted.
    pub(crate) const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::MalformedRequestLine | Self::MalformedHeaderName | Self::RequestInErrorState => {
                Some(StatusCode::BadRequest)
            }
            Self::TooManyHeaders => Some(StatusCode::RequestHeaderFieldsTooLarge),
            Self::BodyTooLarge => Some(StatusCode::PayloadTooLarge),
            Self::UnsupportedBodyEncoding => Some(StatusCode::NotImplemented),
            Self::ConnectionClosedEarly | Self::Io(_) => None,
        }
    }
}

impl error::Error for ErrorKind {}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRequestLine => f.write_str("malformed request line"),
            Self::MalformedHeaderName => f.write_str("malformed header name"),
            Self::TooManyHeaders => f.write_str("too many headers"),
            Self::BodyTooLarge => f.write_str("request body too large"),
            Self::UnsupportedBodyEncoding => f.write_str("unsupported body encoding"),
            Self::RequestInErrorState => f.write_str("request is in the error state"),
            Self::ConnectionClosedEarly => {
                f.write_str("connection closed before the request was complete")
            }
            Self::Io(err) => write!(f, "i/o failure: {}", err.0),
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

/// Wrapper so [`ErrorKind`] can be compared in table-driven tests.
#[derive(Debug)]
pub struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        #[rustfmt::skip]
        let cases = [
            (ErrorKind::MalformedRequestLine,    Some(StatusCode::BadRequest)),
            (ErrorKind::MalformedHeaderName,     Some(StatusCode::BadRequest)),
            (ErrorKind::TooManyHeaders,          Some(StatusCode::RequestHeaderFieldsTooLarge)),
            (ErrorKind::BodyTooLarge,            Some(StatusCode::PayloadTooLarge)),
            (ErrorKind::UnsupportedBodyEncoding, Some(StatusCode::NotImplemented)),
            (ErrorKind::ConnectionClosedEarly,   None),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn io_errors_compare_by_kind() {
        let a = ErrorKind::from(io::Error::new(io::ErrorKind::TimedOut, "read timeout"));
        let b = ErrorKind::from(io::Error::new(io::ErrorKind::TimedOut, "other message"));
        assert_eq!(a, b);
    }
}
