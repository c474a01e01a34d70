//! # kata
//!
//! A minimal HTTP framework for Rust services behind a reverse proxy, with
//! typed request binding and uniform `{code, msg, data}` reply envelopes.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! nginx handles TLS, rate limiting, slow clients, and body-size limits.
//! kata does not, by design. The proxy does proxy things. The framework does
//! framework things. Every feature kata skips is one nginx already ships,
//! tested at scale, at no cost to you.
//!
//! What nginx / ingress already owns, and kata intentionally ignores:
//!
//! - **Body-size limits**: `client_max_body_size` in nginx
//! - **Rate limiting**: `limit_req` / ingress-nginx annotations
//! - **Slow-client protection**: nginx timeout and buffer settings
//! - **TLS termination**: nginx SSL / k8s ingress
//!
//! What's left for kata, the only part that changes between applications:
//!
//! - Radix-tree routing: O(path-length) lookup via [`matchit`]
//! - Async I/O: tokio + hyper, HTTP/1.1 and HTTP/2 alike
//! - Typed binding: request fields into your structs, strategy picked by
//!   negotiation or by name, with a body cache for repeat binds
//! - Reply envelopes: every JSON (and JSONP) answer in one standard shape
//! - Graceful shutdown: SIGTERM / Ctrl-C, drains in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kata::{reply, Request, Response, Router, Server};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .get("/users/{id}", get_user)
//!         .post("/users", create_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown").to_owned();
//!     reply::ok([reply::data(serde_json::json!({ "id": id, "name": "alice" }))])
//! }
//!
//! async fn create_user(mut req: Request) -> Response {
//!     // GET binds the query string, POST + json binds the body. One call.
//!     match req.bind::<CreateUser>().await {
//!         Ok(input) => reply::ok([reply::data(serde_json::json!({ "name": input.name }))]),
//!         Err(e) => reply::err([reply::msg(e.to_string())]),
//!     }
//! }
//! ```
//!
//! Success and failure envelopes both travel as HTTP 200; the envelope's
//! `code` field carries the business outcome. See [`reply`] for why.

mod binding;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod reply;

pub use binding::{BindError, Binding, BodyBinding, BoxError};
pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::Server;

// Callers route and answer in terms of these; re-exported so depending on
// `http` directly stays optional.
pub use http::{Method, StatusCode};
