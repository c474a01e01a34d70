//! Incoming HTTP request type, binding entry points, and the body cache.
//!
//! # Binding
//!
//! Handlers ask for typed input instead of poking at raw bytes. The caller
//! names the destination shape as a type parameter; the request picks a
//! [`Binding`] strategy and hands the decode to it:
//!
//! - [`bind`](Request::bind) negotiates the strategy from the method and
//!   content type,
//! - [`bind_with`](Request::bind_with) uses an explicitly named strategy,
//! - [`bind_body_with`](Request::bind_body_with) runs a body strategy against
//!   the request-scoped body cache.
//!
//! # The body cache
//!
//! A body stream reads once. Binding the same body against two destination
//! shapes (say, a signature wrapper first and the inner payload second) would
//! find the stream drained on the second read. [`body_bytes`](Request::body_bytes)
//! solves this by buffering the body on first use and storing it in the
//! request's extensions; every later cached read observes the identical byte
//! sequence. A failed read caches nothing, so a retry polls the stream again.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use http::request::Parts;
use http::{Extensions, HeaderMap, Method};
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use serde::de::DeserializeOwned;

use crate::binding::{self, BindError, Binding, BodyBinding, BoxError};

/// Extensions key for the cached body. Private: the cache is reachable only
/// through [`Request::body_bytes`] and [`Request::cached_body`], and once set
/// it is never overwritten within the request.
#[derive(Clone)]
struct CachedBody(Bytes);

/// An incoming HTTP request.
///
/// Owns the request head ([`http::request::Parts`]), the body stream, and the
/// path parameters captured by the router. Handlers receive it by value; take
/// it as `mut req` when binding body content.
pub struct Request {
    parts: Parts,
    body: UnsyncBoxBody<Bytes, BoxError>,
    params: HashMap<String, String>,
}

impl Request {
    /// Builds a request from any compatible [`http::Request`].
    ///
    /// The server feeds it hyper's streaming body; tests feed it an in-memory
    /// one. That makes any handler callable without a socket:
    ///
    /// ```rust
    /// use bytes::Bytes;
    /// use http_body_util::Full;
    /// use kata::Request;
    ///
    /// let req = Request::from_http(
    ///     http::Request::builder()
    ///         .method("POST")
    ///         .uri("/users?debug=1")
    ///         .header("content-type", "application/json; charset=utf-8")
    ///         .body(Full::new(Bytes::from_static(br#"{"name":"alice"}"#)))
    ///         .unwrap(),
    /// );
    /// assert_eq!(req.path(), "/users");
    /// assert_eq!(req.content_type(), Some("application/json"));
    /// ```
    pub fn from_http<B>(req: http::Request<B>) -> Self
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        Self {
            parts,
            body: body.map_err(Into::into).boxed_unsync(),
            params: HashMap::new(),
        }
    }

    /// Attaches route path parameters. Called by the server after routing;
    /// tests use it to stand in for the router.
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Case-insensitive header lookup. Returns the first value when the
    /// header repeats, or `None` when the value is not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns a single query parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
        pairs.into_iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// The declared content type with its parameters stripped:
    /// `application/json; charset=utf-8` reads as `application/json`.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type").map(|v| match v.split_once(';') {
            Some((essence, _)) => essence.trim(),
            None => v.trim(),
        })
    }

    /// Request-scoped typed storage, shared with anything else that holds the
    /// request.
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    // ── Binding entry points ──────────────────────────────────────────────────

    /// Binds the request into `T`, negotiating the strategy from the method
    /// and content type: GET and HEAD bind the query string, everything else
    /// binds the body (JSON when declared, urlencoded otherwise).
    ///
    /// ```rust
    /// use kata::{reply, Request, Response};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct CreateUser { name: String }
    ///
    /// async fn create_user(mut req: Request) -> Response {
    ///     match req.bind::<CreateUser>().await {
    ///         Ok(input) => reply::ok([reply::data(serde_json::json!({ "name": input.name }))]),
    ///         Err(e) => reply::err([reply::msg(e.to_string())]),
    ///     }
    /// }
    /// ```
    pub async fn bind<T: DeserializeOwned>(&mut self) -> Result<T, BindError> {
        let strategy = Binding::negotiate(self.method(), self.content_type());
        self.bind_with(strategy).await
    }

    /// Binds with an explicitly named strategy, bypassing negotiation.
    ///
    /// [`Binding::Json`] and [`Binding::Form`] read the body stream to
    /// exhaustion without caching it; use
    /// [`bind_body_with`](Request::bind_body_with) when the body must remain
    /// bindable afterwards.
    pub async fn bind_with<T: DeserializeOwned>(
        &mut self,
        strategy: Binding,
    ) -> Result<T, BindError> {
        match strategy {
            Binding::Json => {
                let body = self.read_body().await?;
                BodyBinding::Json.decode(&body)
            }
            Binding::Form => {
                let body = self.read_body().await?;
                BodyBinding::Form.decode(&body)
            }
            Binding::Query => binding::decode_query(self.query().unwrap_or("")),
            Binding::Header => binding::decode_headers(self.headers()),
        }
    }

    /// Shortcut for [`bind_with`](Request::bind_with) with [`Binding::Json`].
    pub async fn bind_json<T: DeserializeOwned>(&mut self) -> Result<T, BindError> {
        self.bind_with(Binding::Json).await
    }

    /// Shortcut for [`bind_with`](Request::bind_with) with [`Binding::Query`].
    pub async fn bind_query<T: DeserializeOwned>(&mut self) -> Result<T, BindError> {
        self.bind_with(Binding::Query).await
    }

    /// Shortcut for [`bind_with`](Request::bind_with) with [`Binding::Header`].
    pub async fn bind_header<T: DeserializeOwned>(&mut self) -> Result<T, BindError> {
        self.bind_with(Binding::Header).await
    }

    /// Binds the cached body into `T` with a body strategy.
    ///
    /// The body is read and cached on first use, so the same request body can
    /// be bound against several destination shapes:
    ///
    /// ```rust
    /// use kata::{BodyBinding, Request};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Signed { sig: String }
    ///
    /// #[derive(Deserialize)]
    /// struct Payload { name: String, sig: String }
    ///
    /// async fn verify_then_decode(mut req: Request) -> Result<Payload, kata::BindError> {
    ///     let signed: Signed = req.bind_body_with(BodyBinding::Json).await?;
    ///     assert!(!signed.sig.is_empty());
    ///     req.bind_body_with(BodyBinding::Json).await
    /// }
    /// ```
    pub async fn bind_body_with<T: DeserializeOwned>(
        &mut self,
        strategy: BodyBinding,
    ) -> Result<T, BindError> {
        let body = self.body_bytes().await?;
        strategy.decode(&body)
    }

    // ── Body access ───────────────────────────────────────────────────────────

    /// The whole request body, cached on first read.
    ///
    /// The first call reads the stream to completion and stores the bytes in
    /// the request's extensions; every later call returns the same bytes
    /// without touching the stream. On a stream failure the error surfaces as
    /// [`BindError::Read`] and nothing is cached, so the next call re-polls
    /// the stream.
    pub async fn body_bytes(&mut self) -> Result<Bytes, BindError> {
        if let Some(CachedBody(bytes)) = self.parts.extensions.get::<CachedBody>() {
            return Ok(bytes.clone());
        }
        let bytes = self.read_body().await?;
        self.parts.extensions.insert(CachedBody(bytes.clone()));
        Ok(bytes)
    }

    /// Read-only view of the body cache. `None` until a cached read happens.
    pub fn cached_body(&self) -> Option<&Bytes> {
        self.parts.extensions.get::<CachedBody>().map(|c| &c.0)
    }

    /// Reads the body stream to completion without caching. The stream is
    /// polled in place, so an error leaves it owned and resumable.
    async fn read_body(&mut self) -> Result<Bytes, BindError> {
        let mut buf = BytesMut::new();
        while let Some(frame) = self.body.frame().await {
            let frame = frame.map_err(BindError::Read)?;
            if let Some(chunk) = frame.data_ref() {
                buf.extend_from_slice(chunk);
            }
        }
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::Full;

    use super::*;

    fn request(uri: &str, content_type: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        Request::from_http(builder.body(Full::new(Bytes::new())).unwrap())
    }

    #[test]
    fn content_type_strips_parameters() {
        let req = request("/x", Some("application/json; charset=utf-8"));
        assert_eq!(req.content_type(), Some("application/json"));
    }

    #[test]
    fn content_type_absent_without_header() {
        let req = request("/x", None);
        assert_eq!(req.content_type(), None);
    }

    #[test]
    fn query_param_percent_decodes() {
        let req = request("/x?name=al%20ice&mode=a%2Bb", None);
        assert_eq!(req.query_param("name").as_deref(), Some("al ice"));
        assert_eq!(req.query_param("mode").as_deref(), Some("a+b"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn query_param_decodes_plus_as_space() {
        let req = request("/x?q=hello+world", None);
        assert_eq!(req.query_param("q").as_deref(), Some("hello world"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::from_http(
            http::Request::builder()
                .uri("/x")
                .header("X-Request-Id", "abc")
                .body(Full::new(Bytes::new()))
                .unwrap(),
        );
        assert_eq!(req.header("x-request-id"), Some("abc"));
    }

    #[test]
    fn params_attach_and_read_back() {
        let mut params = HashMap::new();
        params.insert("id".to_owned(), "42".to_owned());
        let req = request("/users/42", None).with_params(params);
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.param("other"), None);
    }

    #[test]
    fn cache_starts_unset() {
        let req = request("/x", None);
        assert!(req.cached_body().is_none());
    }
}
