//! Server construction and the accept loop.

use crate::{
    limits::{ConnLimits, ReqLimits},
    router::{Handler, Router},
    server::connection,
};
use std::{io, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

/// An HTTP server that accepts connections and serves one request per
/// connection.
///
/// The handler (usually a [`Router`] behind optional middleware) is fixed
/// at build time and shared read-only across connections; each accepted
/// connection gets its own task, so a slow or blocking handler stalls only
/// that connection.
///
/// # Examples
///
/// ```no_run
/// use anvil_web::{Router, Server, StatusCode};
/// use tokio::net::TcpListener;
///
/// #[tokio::main]
/// async fn main() {
///     let mut router = Router::new();
///     router.register("GET", "/hello/{name}", |w, req| {
///         let name = req.path_param("name").unwrap_or("stranger");
///         w.respond(StatusCode::Ok, format!("Hello {name}").as_bytes());
///     });
///
///     Server::builder()
///         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
///         .router(router)
///         .build()
///         .launch()
///         .await;
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    handler: Handler,
    req_limits: ReqLimits,
    conn_limits: ConnLimits,
}

impl Server {
    /// Creates a new builder for configuring the server instance.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The address the listener is bound to. Useful with port `0`.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop forever, spawning one task per connection.
    pub async fn launch(self) {
        loop {
            let (stream, client_addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept connection");
                    continue;
                }
            };

            tracing::debug!(%client_addr, "accepted connection");

            let handler = Arc::clone(&self.handler);
            let req_limits = self.req_limits.clone();
            let conn_limits = self.conn_limits.clone();
            tokio::spawn(async move {
                connection::run(stream, client_addr, handler, req_limits, conn_limits).await;
            });
        }
    }
}

/// Builder for configuring and creating [`Server`] instances.
#[derive(Default)]
pub struct ServerBuilder {
    listener: Option<TcpListener>,
    handler: Option<Handler>,
    request_limits: Option<ReqLimits>,
    connection_limits: Option<ConnLimits>,
}

impl ServerBuilder {
    /// Sets the TCP listener the server accepts connections from.
    ///
    /// **This is a required component.**
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the root handler every decoded request is passed to.
    ///
    /// Either this or [`router`](ServerBuilder::router) is required. Use
    /// this form to install a middleware-wrapped handler built with
    /// [`chain`](crate::chain).
    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Shorthand for [`handler`](ServerBuilder::handler) with a bare
    /// [`Router`].
    pub fn router(self, router: Router) -> Self {
        self.handler(router.into_handler())
    }

    /// Configures request decoding limits.
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.request_limits = Some(limits);
        self
    }

    /// Configures connection limits.
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Finalizes the builder and constructs a [`Server`] instance.
    ///
    /// # Panics
    ///
    /// Panics when [`listener`](ServerBuilder::listener) or a handler
    /// ([`handler`](ServerBuilder::handler)/[`router`](ServerBuilder::router))
    /// was not provided.
    #[track_caller]
    pub fn build(self) -> Server {
        Server {
            listener: self
                .listener
                .expect("The `listener` method must be called to create"),
            handler: self
                .handler
                .expect("The `handler` or `router` method must be called to create"),
            req_limits: self.request_limits.unwrap_or_default(),
            conn_limits: self.connection_limits.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn launch_server(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Server::builder().listener(listener).router(router).build();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.launch());
        addr
    }

    async fn get(addr: SocketAddr, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    #[tokio::test]
    async fn serves_over_tcp() {
        let mut router = Router::new();
        router.register("GET", "/ping", |w, _| w.respond(StatusCode::Ok, b"pong"));
        let addr = launch_server(router).await;

        let response = get(addr, b"GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("connection: close\r\n"));
        assert!(response.ends_with("pong"));
    }

    #[tokio::test]
    async fn each_connection_gets_one_request() {
        let mut router = Router::new();
        router.register("GET", "/", |w, _| w.respond(StatusCode::Ok, b"root"));
        let addr = launch_server(router).await;

        // Connections are independent; a second request needs a second one.
        for _ in 0..2 {
            let response = get(addr, b"GET / HTTP/1.1\r\n\r\n").await;
            assert!(response.ends_with("root"));
        }
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let addr = launch_server(Router::new()).await;

        let response = get(addr, b"GET /missing HTTP/1.1\r\n\r\n").await;

        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    #[should_panic(expected = "The `listener` method must be called")]
    fn build_requires_listener() {
        let _ = Server::builder().router(Router::new()).build();
    }
}
