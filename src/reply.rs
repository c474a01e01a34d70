//! Uniform `{code, msg, data}` reply envelopes.
//!
//! Every JSON endpoint in a fleet either answers with one shape or every
//! client grows its own parsing quirks. This module pins the shape down:
//!
//! ```text
//! {"code": 0, "msg": "success", "data": ...}    data omitted when unset
//! ```
//!
//! [`ok`] and [`err`] start from the default success or failure envelope,
//! apply the caller's [`Mutator`]s in order, and serialize the result.
//! Later mutators overwrite earlier ones, per field:
//!
//! ```rust
//! use kata::{reply, Request, Response};
//!
//! async fn get_user(_req: Request) -> Response {
//!     reply::ok([reply::data(serde_json::json!({ "id": 1 }))])
//! }
//!
//! async fn reject(_req: Request) -> Response {
//!     reply::err([reply::code(1004), reply::msg("no such user")])
//! }
//! ```
//!
//! # Transport status versus envelope code
//!
//! The HTTP status is always `200 OK`, for failure envelopes too. The
//! transport reports "the request was handled"; the envelope's own `code`
//! carries the business outcome, and clients are expected to inspect it.
//! This convention is load-bearing for existing clients; changing it is an
//! API break, not a cleanup.
//!
//! # JSONP
//!
//! [`ok_jsonp`] and [`err_jsonp`] wrap the serialized envelope in a callback
//! invocation when the request carries a well-formed `callback` query
//! parameter, and degrade to plain JSON when it is absent or rejected.

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::request::Request;
use crate::response::{ContentType, Response};

/// Envelope code for a successful reply.
pub const CODE_OK: i32 = 0;
/// Envelope code for a failed reply.
pub const CODE_ERR: i32 = 1;
/// Default message for a successful reply.
pub const MSG_SUCCESS: &str = "success";
/// Default message for a failed reply.
pub const MSG_FAILED: &str = "failed";

// ── Envelope ──────────────────────────────────────────────────────────────────

/// The standard reply body: a logical outcome code, a human-readable message,
/// and an optional payload of arbitrary shape.
///
/// Created fresh per reply, edited only by the mutators the caller supplies,
/// discarded after serialization.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    fn success() -> Self {
        Self {
            code: CODE_OK,
            msg: MSG_SUCCESS.to_owned(),
            data: None,
        }
    }

    fn failure() -> Self {
        Self {
            code: CODE_ERR,
            msg: MSG_FAILED.to_owned(),
            data: None,
        }
    }
}

// ── Mutators ──────────────────────────────────────────────────────────────────

/// One edit applied to an [`Envelope`] before serialization.
///
/// Build them with [`data`], [`msg`], [`code`], or [`Mutator::new`] for a
/// custom edit. Application order is argument order; the last edit of a field
/// wins, with no conflict detection.
pub struct Mutator(Edit);

enum Edit {
    Apply(Box<dyn FnOnce(&mut Envelope) + Send>),
    /// A payload that failed to serialize in [`data`]. Surfaces when the
    /// reply is built, as the empty-500 escape hatch.
    Poisoned(serde_json::Error),
}

impl Mutator {
    /// Wraps a caller-supplied edit.
    ///
    /// ```rust
    /// use kata::reply::{self, Mutator};
    ///
    /// let elevate = Mutator::new(|envelope| envelope.code = -1);
    /// let res = reply::err([elevate]);
    /// ```
    pub fn new(edit: impl FnOnce(&mut Envelope) + Send + 'static) -> Self {
        Self(Edit::Apply(Box::new(edit)))
    }
}

/// Sets the envelope payload.
///
/// The value serializes to a [`Value`] here, at construction. If that fails
/// (non-string map keys, a failing `Serialize` impl) the failure is carried
/// inside the mutator and the reply it is passed to becomes an empty 500.
pub fn data(value: impl Serialize) -> Mutator {
    match serde_json::to_value(value) {
        Ok(value) => Mutator::new(move |envelope| envelope.data = Some(value)),
        Err(e) => Mutator(Edit::Poisoned(e)),
    }
}

/// Overrides the envelope message.
pub fn msg(text: impl Into<String>) -> Mutator {
    let text = text.into();
    Mutator::new(move |envelope| envelope.msg = text)
}

/// Overrides the envelope code.
pub fn code(value: i32) -> Mutator {
    Mutator::new(move |envelope| envelope.code = value)
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Success envelope, serialized as JSON. HTTP status is 200.
///
/// With no mutators the body is exactly `{"code":0,"msg":"success"}`.
pub fn ok(mutators: impl IntoIterator<Item = Mutator>) -> Response {
    finish(Envelope::success(), mutators)
}

/// Failure envelope, serialized as JSON. HTTP status is still 200; the
/// failure lives in the envelope's `code`.
///
/// With no mutators the body is exactly `{"code":1,"msg":"failed"}`.
pub fn err(mutators: impl IntoIterator<Item = Mutator>) -> Response {
    finish(Envelope::failure(), mutators)
}

/// Success envelope as JSONP when the request names a callback, JSON
/// otherwise. See [`module docs`](self) for the callback convention.
pub fn ok_jsonp(req: &Request, mutators: impl IntoIterator<Item = Mutator>) -> Response {
    finish_jsonp(req, Envelope::success(), mutators)
}

/// Failure envelope as JSONP when the request names a callback, JSON
/// otherwise.
pub fn err_jsonp(req: &Request, mutators: impl IntoIterator<Item = Mutator>) -> Response {
    finish_jsonp(req, Envelope::failure(), mutators)
}

fn finish(envelope: Envelope, mutators: impl IntoIterator<Item = Mutator>) -> Response {
    match render(envelope, mutators) {
        Ok(body) => Response::json(body),
        Err(e) => serialization_failed(e),
    }
}

fn finish_jsonp(
    req: &Request,
    envelope: Envelope,
    mutators: impl IntoIterator<Item = Mutator>,
) -> Response {
    let json = match render(envelope, mutators) {
        Ok(body) => body,
        Err(e) => return serialization_failed(e),
    };

    match callback_name(req) {
        Some(name) => {
            let mut body = Vec::with_capacity(name.len() + json.len() + 2);
            body.extend_from_slice(name.as_bytes());
            body.push(b'(');
            body.extend_from_slice(&json);
            body.push(b')');
            Response::builder().bytes(ContentType::JavaScript, body)
        }
        None => Response::json(json),
    }
}

/// Applies the mutators in order and serializes the result.
fn render(
    mut envelope: Envelope,
    mutators: impl IntoIterator<Item = Mutator>,
) -> Result<Vec<u8>, serde_json::Error> {
    for mutator in mutators {
        match mutator.0 {
            Edit::Apply(edit) => edit(&mut envelope),
            Edit::Poisoned(e) => return Err(e),
        }
    }
    serde_json::to_vec(&envelope)
}

/// Handlers never see a reply error; a payload that cannot serialize becomes
/// an empty 500 and a log line.
fn serialization_failed(e: serde_json::Error) -> Response {
    error!("reply serialization failed: {e}");
    Response::status(StatusCode::INTERNAL_SERVER_ERROR)
}

/// The `callback` query parameter, when present, non-empty, and plausible as
/// a JS member path. An ill-formed callback is rejected and the reply
/// degrades to plain JSON.
fn callback_name(req: &Request) -> Option<String> {
    let name = req.query_param("callback").filter(|n| !n.is_empty())?;
    if valid_callback(&name) {
        Some(name)
    } else {
        warn!(callback = %name, "rejected jsonp callback, replying with plain json");
        None
    }
}

/// `[A-Za-z_$]` first, then `[A-Za-z0-9_$.\[\]]`. Tight enough that the wire
/// never carries an injected script body as a callback name.
fn valid_callback(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '[' | ']'))
}
