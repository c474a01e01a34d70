//! Minimal kata example. Typed binding plus envelope replies.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl 'http://localhost:3000/search?term=rust&page=2'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X POST http://localhost:3000/events \
//!        -H 'content-type: application/json' \
//!        -d '{"kind":"deploy","detail":"v1.2.3 to prod"}'
//!   curl 'http://localhost:3000/whoami?callback=render'
//!   curl http://localhost:3000/healthz

use kata::{BodyBinding, Request, Response, Router, Server, health, reply};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct Search {
    term: String,
    #[serde(default)]
    page: u32,
}

#[derive(Deserialize)]
struct CreateUser {
    name: String,
}

#[derive(Deserialize)]
struct EventKind {
    kind: String,
}

#[derive(Deserialize)]
struct Event {
    kind: String,
    detail: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .get("/search",   search)
        .post("/users",   create_user)
        .post("/events",  record_event)
        .get("/whoami",   whoami)
        .get("/healthz",  health::liveness)
        .get("/readyz",   health::readiness);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /search?term=rust&page=2
//
// bind() on a GET reads the query string. The same handler body would
// accept a JSON POST unchanged; negotiation picks the source.
async fn search(mut req: Request) -> Response {
    match req.bind::<Search>().await {
        Ok(q) => reply::ok([reply::data(json!({ "term": q.term, "page": q.page }))]),
        Err(e) => reply::err([reply::msg(e.to_string())]),
    }
}

// POST /users
async fn create_user(mut req: Request) -> Response {
    match req.bind::<CreateUser>().await {
        Ok(input) => reply::ok([reply::data(json!({ "id": 99, "name": input.name }))]),
        Err(e) => reply::err([reply::msg(e.to_string())]),
    }
}

// POST /events
//
// Binds the body twice: once to peek at the kind, once for the full
// payload. The second bind reuses the cached bytes, so the stream being
// consumed the first time does not matter.
async fn record_event(mut req: Request) -> Response {
    let kind: EventKind = match req.bind_body_with(BodyBinding::Json).await {
        Ok(k) => k,
        Err(e) => return reply::err([reply::msg(e.to_string())]),
    };

    if kind.kind != "deploy" {
        return reply::err([reply::msg(format!("unsupported kind: {}", kind.kind))]);
    }

    match req.bind_body_with::<Event>(BodyBinding::Json).await {
        Ok(event) => {
            reply::ok([reply::data(json!({ "kind": event.kind, "detail": event.detail }))])
        }
        Err(e) => reply::err([reply::msg(e.to_string())]),
    }
}

// GET /whoami?callback=render
//
// With a valid callback the reply is wrapped as render({...}) for a
// script tag; without one (or with a bad one) it degrades to plain JSON.
async fn whoami(req: Request) -> Response {
    reply::ok_jsonp(&req, [reply::data(json!({ "user": "alice" }))])
}
