//! Request routing and middleware composition.
//!
//! # Examples
//!
//! ```
//! use anvil_web::{chain, logging, Router, StatusCode};
//!
//! let mut router = Router::new();
//! router.register("GET", "/users/{id}", |w, req| {
//!     let id = req.path_param("id").unwrap_or("unknown");
//!     w.respond(StatusCode::Ok, id.as_bytes());
//! });
//!
//! // First-declared middleware ends up outermost.
//! let root = chain(router.into_handler(), vec![logging()]);
//! ```

use crate::{
    http::{request::Request, response::ResponseWriter},
    StatusCode,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A request handler: drives the [`ResponseWriter`] to completion before
/// returning. Blocking in a handler stalls only its own connection task.
pub type Handler = Arc<dyn Fn(&mut ResponseWriter, &mut Request) + Send + Sync>;

/// A handler-to-handler transform, applied once when the chain is built.
pub type Middleware = Box<dyn FnOnce(Handler) -> Handler>;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route {
    method: String,
    segments: Vec<Segment>,
    handler: Handler,
}

/// Matches decoded requests against registered `(method, pattern)` routes.
///
/// Routes are scanned in registration order and the first full match wins;
/// there is no static-over-dynamic precedence or specificity ranking.
/// Pattern segments wrapped in `{`..`}` are parameters: they match any
/// request segment and bind it under their name
/// ([`Request::path_param`]).
///
/// The route table is meant to be built once before the server starts and
/// is read-only afterwards; [`into_handler`](Router::into_handler) freezes
/// it behind an [`Arc`] for exactly that lifecycle.
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates a router with no routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers `handler` for `method` and `pattern`.
    ///
    /// The pattern is split into segments once, here; matching later is
    /// segment-by-segment and case-sensitive for literals.
    pub fn register<F>(&mut self, method: &str, pattern: &str, handler: F)
    where
        F: Fn(&mut ResponseWriter, &mut Request) + Send + Sync + 'static,
    {
        self.register_handler(method, pattern, Arc::new(handler));
    }

    /// [`register`](Router::register) for an already-built (e.g. chained)
    /// [`Handler`].
    pub fn register_handler(&mut self, method: &str, pattern: &str, handler: Handler) {
        self.routes.push(Route {
            method: method.to_string(),
            segments: compile_pattern(pattern),
            handler,
        });
    }

    /// Resolves `req` to a registered handler and invokes it.
    ///
    /// On a match the route's parameter bindings are stored into the
    /// request before the handler runs. When nothing matches, the router
    /// itself writes a `404 Not Found` response; an unmatched route is a
    /// normal outcome, not an error.
    pub fn dispatch(&self, w: &mut ResponseWriter, req: &mut Request) {
        let mut matched = None;

        {
            let parts: Vec<&str> = req.path().trim_matches('/').split('/').collect();

            'routes: for route in &self.routes {
                if route.method != req.method() || route.segments.len() != parts.len() {
                    continue;
                }

                let mut params = HashMap::new();
                for (segment, part) in route.segments.iter().zip(&parts) {
                    match segment {
                        Segment::Literal(literal) => {
                            if literal.as_str() != *part {
                                continue 'routes;
                            }
                        }
                        Segment::Param(name) => {
                            params.insert(name.clone(), (*part).to_string());
                        }
                    }
                }

                matched = Some((Arc::clone(&route.handler), params));
                break;
            }
        }

        match matched {
            Some((handler, params)) => {
                req.path_params = params;
                handler(w, req);
            }
            None => w.respond(StatusCode::NotFound, b"404 Not Found"),
        }
    }

    /// Consumes the router into a [`Handler`] so it can be wrapped by
    /// middleware and handed to the server.
    pub fn into_handler(self) -> Handler {
        let router = Arc::new(self);
        Arc::new(move |w, req| router.dispatch(w, req))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .trim_matches('/')
        .split('/')
        .map(|segment| {
            // Exactly one brace pair marks a parameter.
            match segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            }
        })
        .collect()
}

/// Wraps `handler` in `middlewares` so that the first middleware's
/// pre-logic runs first and its post-logic runs last.
///
/// Middlewares are applied in reverse, wrapping inward, which is what puts
/// the first-declared one outermost.
pub fn chain<I>(handler: Handler, middlewares: I) -> Handler
where
    I: IntoIterator<Item = Middleware>,
    I::IntoIter: DoubleEndedIterator,
{
    middlewares
        .into_iter()
        .rev()
        .fold(handler, |next, middleware| middleware(next))
}

/// Middleware that logs every request with its method, path, response
/// status, and handling duration.
pub fn logging() -> Middleware {
    Box::new(|next: Handler| {
        let handler: Handler = Arc::new(move |w, req| {
            let start = Instant::now();
            next(w, req);

            let status = w.status().map(|s| s.code()).unwrap_or(0);
            tracing::info!(
                method = %req.method(),
                path = %req.path(),
                status,
                elapsed = ?start.elapsed(),
                "request served"
            );
        });
        handler
    })
}
