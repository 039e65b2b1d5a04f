use anvil_web::{chain, logging, Request, ResponseWriter, Router, Server, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tokio::net::TcpListener;

#[derive(Serialize)]
struct UserData {
    id: u32,
    name: String,
}

#[derive(Deserialize)]
struct CreateUserRequest {
    name: String,
    #[allow(dead_code)]
    age: u32,
}

fn handle_hello(w: &mut ResponseWriter, req: &mut Request) {
    let name = req.path_param("name").unwrap_or("stranger");
    w.respond(StatusCode::Ok, format!("Hello {name}").as_bytes());
}

fn handle_create_message(w: &mut ResponseWriter, req: &mut Request) {
    let message = String::from_utf8_lossy(req.body());
    tracing::info!(%message, "received new message");

    let body = format!("Message created successfully: {message}");
    w.respond(StatusCode::Created, body.as_bytes());
}

fn handle_query_test(w: &mut ResponseWriter, req: &mut Request) {
    let mut body = String::from("Query Parameters:\n");
    for (name, values) in req.query().iter() {
        for value in values {
            let _ = writeln!(body, "- {name}: {value}");
        }
    }

    w.respond(StatusCode::Ok, body.as_bytes());
}

fn handle_user_json(w: &mut ResponseWriter, _req: &mut Request) {
    let user = UserData {
        id: 123,
        name: "Parth".to_string(),
    };
    w.json(StatusCode::Ok, &user);
}

fn handle_create_user(w: &mut ResponseWriter, req: &mut Request) {
    let parsed: CreateUserRequest = match serde_json::from_slice(req.body()) {
        Ok(parsed) => parsed,
        Err(_) => {
            w.json(
                StatusCode::BadRequest,
                &serde_json::json!({ "error": "Invalid request body" }),
            );
            return;
        }
    };

    let new_user = UserData {
        id: 456,
        name: parsed.name,
    };
    w.json(StatusCode::Created, &new_user);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let mut router = Router::new();
    router.register("GET", "/hello/{name}", handle_hello);
    router.register("POST", "/messages", handle_create_message);
    router.register("GET", "/query-test", handle_query_test);
    router.register("GET", "/user", handle_user_json);
    router.register("POST", "/user", handle_create_user);

    let root = chain(router.into_handler(), vec![logging()]);

    let server = Server::builder()
        .listener(TcpListener::bind("127.0.0.1:42069").await.unwrap())
        .handler(root)
        .build();

    tracing::info!(addr = %server.local_addr().unwrap(), "server started");
    server.launch().await;
}
