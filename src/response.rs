//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. For the standard
//! `{code, msg, data}` envelopes, use [`reply`](crate::reply) instead of
//! assembling JSON here by hand.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Csv,         // text/csv
    EventStream, // text/event-stream  (SSE)
    FormData,    // application/x-www-form-urlencoded
    Html,        // text/html; charset=utf-8
    JavaScript,  // application/javascript; charset=utf-8  (JSONP)
    Json,        // application/json
    OctetStream, // application/octet-stream  (binary / file download)
    Text,        // text/plain; charset=utf-8
    Xml,         // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::FormData => "application/x-www-form-urlencoded",
            Self::Html => "text/html; charset=utf-8",
            Self::JavaScript => "application/javascript; charset=utf-8",
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text => "text/plain; charset=utf-8",
            Self::Xml => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// Fields are public so tests can assert on what a handler produced without
/// a socket in the loop.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use kata::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use kata::{ContentType, Response, StatusCode};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder()
///     .status(StatusCode::OK)
///     .bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// `200 OK` with `application/json`.
    ///
    /// Pass bytes from your serialiser directly, no intermediate allocation:
    /// `serde_json::to_vec(&val)?` or `format!(r#"{{"id":{id}}}"#).into_bytes()`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::with_content_type(ContentType::Json, body.into())
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_content_type(ContentType::Text, Bytes::from(body.into()))
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self {
            status: code,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    fn with_content_type(content_type: ContentType, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type.as_str()),
        );
        Self {
            status: StatusCode::OK,
            headers,
            body,
        }
    }

    /// Hands the response to hyper. Content-length comes from the body.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// typed body method, so you always know what you are sending.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header. Repeated names keep every value.
    ///
    /// A name or value that is not a valid HTTP header string is skipped
    /// with a warning; the pair never reaches the wire. Request-derived
    /// values (CRLF included) can therefore not break the response.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = name, "skipping invalid response header"),
        }
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(ContentType::Json, body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text, Bytes::from(body.into()))
    }

    /// Terminate with a typed body. Use this for XML, HTML, binary, SSE, etc.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, body.into())
    }

    /// Terminate with no body (e.g. `StatusCode::NO_CONTENT`).
    pub fn no_body(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: Bytes::new(),
        }
    }

    fn finish(mut self, content_type: ContentType, body: Bytes) -> Response {
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type.as_str()),
        );
        Response {
            status: self.status,
            headers: self.headers,
            body,
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
///
/// # Example: a typed wrapper over the reply envelope
///
/// ```rust
/// use kata::{reply, IntoResponse, Request, Response};
/// use serde::Serialize;
///
/// struct Payload<T: Serialize>(T);
///
/// impl<T: Serialize> IntoResponse for Payload<T> {
///     fn into_response(self) -> Response {
///         reply::ok([reply::data(self.0)])
///     }
/// }
///
/// #[derive(Serialize)]
/// struct User { id: u64 }
///
/// async fn get_user(_req: Request) -> Payload<User> {
///     Payload(User { id: 1 })
/// }
/// ```
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NOT_FOUND`.
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

/// `Ok` produces the success response, `Err` the error response.
impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(value) => value.into_response(),
            Err(error) => error.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shortcut_sets_content_type_and_ok() {
        let res = Response::json(br#"{"id":1}"#.to_vec());
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(
            res.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(res.body.as_ref(), br#"{"id":1}"#);
    }

    #[test]
    fn builder_keeps_status_and_headers() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/42")
            .json(b"{}".to_vec());
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.headers.get("location").unwrap(), "/users/42");
        assert_eq!(
            res.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn builder_skips_invalid_header_pairs() {
        let res = Response::builder()
            .header("x-ok", "fine")
            .header("x-bad", "evil\r\nx-injected: 1")
            .header("bad name", "nope")
            .json(b"{}".to_vec());
        assert_eq!(res.headers.get("x-ok").unwrap(), "fine");
        assert!(res.headers.get("x-bad").is_none());
        // x-ok plus content-type, nothing else
        assert_eq!(res.headers.len(), 2);
    }

    #[test]
    fn no_body_has_empty_body() {
        let res = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .no_body();
        assert!(res.body.is_empty());
        assert!(res.headers.get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn str_and_status_into_response() {
        let res = "hello".into_response();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body.as_ref(), b"hello");

        let res = StatusCode::NOT_FOUND.into_response();
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(res.body.is_empty());
    }

    #[test]
    fn result_into_response_picks_the_arm() {
        let ok: Result<&'static str, StatusCode> = Ok("fine");
        assert_eq!(ok.into_response().status, StatusCode::OK);

        let err: Result<&'static str, StatusCode> = Err(StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn into_http_transfers_everything() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("x-trace", "t1")
            .text("done")
            .into_http();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers().get("x-trace").unwrap(), "t1");
    }
}
