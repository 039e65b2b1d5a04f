//! anvil_web - Incremental HTTP/1.1 server with pattern routing and middleware
//!
//! A small HTTP server built directly on TCP: a resumable request decoder
//! that accepts reads of any size at any boundary, a case-insensitive
//! multi-value header table, and an ordered router with `{param}` path
//! segments and composable middleware.
//!
//! # Protocol support
//!
//! - **HTTP/1.1 only**, one request per connection (`Connection: close`)
//! - Bodies framed by `Content-Length`; `Transfer-Encoding: chunked` is
//!   rejected with `501 Not Implemented`
//! - No TLS, HTTP/2, keep-alive, or compression
//!
//! # Examples
//!
//! Quick start:
//! ```no_run
//! use anvil_web::{Router, Server, StatusCode};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut router = Router::new();
//!     router.register("GET", "/hello/{name}", |w, req| {
//!         let name = req.path_param("name").unwrap_or("stranger");
//!         w.respond(StatusCode::Ok, format!("Hello {name}").as_bytes());
//!     });
//!
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
//!         .router(router)
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```
//!
//! With middleware, applied outermost-first in declaration order:
//! ```no_run
//! use anvil_web::{chain, logging, Router, Server, StatusCode};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut router = Router::new();
//!     router.register("GET", "/", |w, _| w.respond(StatusCode::Ok, b"hi"));
//!
//!     let root = chain(router.into_handler(), vec![logging()]);
//!
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
//!         .handler(root)
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```
//!
//! # Decoding without a server
//!
//! The decoder is plain state over bytes; no socket is required:
//! ```
//! use anvil_web::{limits::ReqLimits, RequestDecoder};
//!
//! let mut decoder = RequestDecoder::new(&ReqLimits::default());
//! decoder.decode(b"GET /x HTTP/1.1\r\n\r\n").unwrap();
//!
//! let request = decoder.into_request().unwrap();
//! assert_eq!(request.path(), "/x");
//! ```

pub(crate) mod http {
    pub(crate) mod headers;
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod errors;
pub mod limits;
pub(crate) mod router;
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}

pub use crate::{
    errors::ErrorKind,
    http::{
        headers::HeaderTable,
        query::{self, Query},
        request::{Request, RequestDecoder, RequestLine},
        response::ResponseWriter,
        types::StatusCode,
    },
    router::{chain, logging, Handler, Middleware, Router},
    server::server_impl::{Server, ServerBuilder},
};
