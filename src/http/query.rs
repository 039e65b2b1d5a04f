//! URL query string parsing with percent-decoding.

use std::collections::HashMap;
use std::{error, fmt};

/// Decoded query parameters from a request target.
///
/// A name can appear any number of times; every occurrence is kept in
/// order. Percent escapes and `+` (as space) are decoded in both names and
/// values.
///
/// # Examples
/// ```
/// use anvil_web::Query;
///
/// let query = Query::parse("name=john&tag=a&tag=b&debug").unwrap();
///
/// assert_eq!(query.get("name"), Some("john"));
/// assert_eq!(query.get_all("tag"), ["a", "b"]);
/// assert_eq!(query.get("debug"), Some(""));
/// assert_eq!(query.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    params: HashMap<String, Vec<String>>,
}

impl Query {
    /// Parses a raw query string (an optional leading `?` is tolerated).
    ///
    /// Empty pairs (`a=1&&b=2`) are skipped; a pair without `=` becomes a
    /// name with an empty value. A malformed escape or a name/value that
    /// does not decode to UTF-8 fails the whole parse.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut params: HashMap<String, Vec<String>> = HashMap::new();

        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (name, value) = match pair.split_once('=') {
                Some((name, value)) => (name, value),
                None => (pair, ""),
            };

            let name = decode_component(name)?;
            let value = decode_component(value)?;
            params.entry(name).or_default().push(value);
        }

        Ok(Self { params })
    }

    /// Returns the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value for `name`, in occurrence order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.params.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct parameter names.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no parameters were present.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates `(name, values)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}

fn decode_component(raw: &str) -> Result<String, Error> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
                let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => return Err(Error::InvalidEscape),
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).map_err(|_| Error::InvalidEncoding)
}

/// Reasons a query string fails to parse.
///
/// The request decoder treats any of these as "no query": a malformed
/// query degrades to an empty [`Query`] instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A `%` escape was truncated or not followed by two hex digits.
    InvalidEscape,
    /// A name or value did not decode to valid UTF-8.
    InvalidEncoding,
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidEscape => write!(f, "invalid percent escape in query string"),
            Error::InvalidEncoding => write!(f, "query component is not valid UTF-8"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic() {
        let cases = ["a=1&b=2", "?a=1&b=2"];

        for raw in cases {
            let query = Query::parse(raw).unwrap();

            assert_eq!(query.len(), 2);
            assert_eq!(query.get("a"), Some("1"));
            assert_eq!(query.get("b"), Some("2"));
        }
    }

    #[test]
    fn repeated_names_keep_every_value() {
        let query = Query::parse("a=1&a=2&a=3").unwrap();

        assert_eq!(query.get("a"), Some("1"));
        assert_eq!(query.get_all("a"), ["1", "2", "3"]);
    }

    #[test]
    fn full() {
        let query = Query::parse("flag&empty=&=val&&key=value").unwrap();

        assert_eq!(query.len(), 4);
        assert_eq!(query.get("flag"), Some(""));
        assert_eq!(query.get("empty"), Some(""));
        assert_eq!(query.get(""), Some("val"));
        assert_eq!(query.get("key"), Some("value"));
    }

    #[test]
    fn decoding() {
        #[rustfmt::skip]
        let cases = [
            ("email=user%40example.com", "email", "user@example.com"),
            ("q=hello+world",            "q",     "hello world"),
            ("q=hello%20world",          "q",     "hello world"),
            ("snow=%E2%9B%84",           "snow",  "⛄"),
            ("very=long=value=with=equals", "very", "long=value=with=equals"),
        ];

        for (raw, name, value) in cases {
            let query = Query::parse(raw).unwrap();
            assert_eq!(query.get(name), Some(value), "case: {raw}");
        }
    }

    #[test]
    fn decoded_names() {
        let query = Query::parse("na%6de=x").unwrap();
        assert_eq!(query.get("name"), Some("x"));
    }

    #[test]
    fn empty_input() {
        assert!(Query::parse("").unwrap().is_empty());
        assert!(Query::parse("?").unwrap().is_empty());
    }

    #[test]
    fn malformed_escapes() {
        #[rustfmt::skip]
        let cases = [
            ("a=%zz", Error::InvalidEscape),
            ("a=%1",  Error::InvalidEscape),
            ("a=%",   Error::InvalidEscape),
            ("a=%FF", Error::InvalidEncoding),
        ];

        for (raw, expected) in cases {
            assert_eq!(Query::parse(raw), Err(expected), "case: {raw}");
        }
    }
}
