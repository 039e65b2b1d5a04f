use anvil_web::{Router, Server, StatusCode};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let mut router = Router::new();
    router.register("GET", "/", |w, _| {
        w.respond(StatusCode::Ok, b"All good, frfr\n");
    });
    router.register("GET", "/yourproblem", |w, _| {
        w.respond(StatusCode::BadRequest, b"Your problem is not my problem\n");
    });
    router.register("GET", "/myproblem", |w, _| {
        w.respond(StatusCode::InternalServerError, b"Woopsie, my bad\n");
    });

    let server = Server::builder()
        .listener(TcpListener::bind("127.0.0.1:42069").await.unwrap())
        .router(router)
        .build();

    tracing::info!(addr = %server.local_addr().unwrap(), "server started");
    server.launch().await;
}
