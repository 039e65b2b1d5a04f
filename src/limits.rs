//! Decoder and connection configuration limits
//!
//! Defaults are intentionally conservative: a request that needs more than
//! them is almost always hostile or misconfigured, and every limit can be
//! raised per server through the builder.
//!
//! # Examples
//!
//! ```no_run
//! use anvil_web::{limits::ReqLimits, Router, Server, StatusCode};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut router = Router::new();
//!     router.register("GET", "/", |w, _| w.respond(StatusCode::Ok, b"hi"));
//!
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
//!         .router(router)
//!         .request_limits(ReqLimits {
//!             max_body_size: 16 * 1024, // 16KB for larger payloads
//!             ..ReqLimits::default()
//!         })
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```

use std::time::Duration;

/// Controls how much of a single request the decoder will accept.
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Size of each read from the connection, in bytes (default: `1024`).
    ///
    /// The decoder accepts chunks of any size and any boundary; this only
    /// tunes how much is pulled from the socket per read.
    pub read_chunk_size: usize,

    /// Maximum number of distinct header names (default: `64`).
    ///
    /// Repeated names combine into one comma-joined entry and count once.
    /// Exceeding the limit fails the request with
    /// [`TooManyHeaders`](crate::ErrorKind::TooManyHeaders).
    pub max_header_count: usize,

    /// Maximum declared `Content-Length`, in bytes (default: `1 MiB`).
    ///
    /// Checked before any body byte is buffered, so an oversized request
    /// fails with [`BodyTooLarge`](crate::ErrorKind::BodyTooLarge) without
    /// allocating for its body.
    pub max_body_size: usize,
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            read_chunk_size: 1024,
            max_header_count: 64,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Controls the lifetime of a single connection.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Deadline for decoding one full request (default: `30s`).
    ///
    /// Covers everything from the first read to the final body byte. A
    /// connection that stalls past it receives `408 Request Timeout` and is
    /// closed. Handler execution is not covered; a handler may take as long
    /// as it needs.
    pub read_timeout: Duration,
}

impl Default for ConnLimits {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
        }
    }
}
