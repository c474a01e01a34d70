//! Binding strategies: how a request's fields become a typed value.
//!
//! A strategy names one place a request carries data (JSON body, urlencoded
//! body, query string, headers) and one way to decode it. The set is closed:
//! strategies are enum variants, not trait objects, so dispatch is a `match`
//! and adding a strategy is a compile-visible change.
//!
//! Handlers normally reach strategies through [`Request`](crate::Request):
//! [`bind`](crate::Request::bind) negotiates one from the method and content
//! type, [`bind_with`](crate::Request::bind_with) takes one by name, and
//! [`bind_body_with`](crate::Request::bind_body_with) runs a body strategy
//! against the request-scoped body cache.

use std::fmt;

use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A boxed error that can cross thread boundaries.
///
/// Body streams and strategy decoders report different concrete error types;
/// they all surface through this alias.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ── Strategies ────────────────────────────────────────────────────────────────

/// A named binding strategy.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Binding {
    /// JSON request body (`application/json`).
    Json,
    /// URL-encoded request body (`application/x-www-form-urlencoded`).
    Form,
    /// URI query string.
    Query,
    /// Request headers.
    Header,
}

impl Binding {
    /// Picks a strategy from the request method and declared content type.
    ///
    /// GET and HEAD requests carry their fields in the query string. Anything
    /// else binds from the body: JSON when declared, urlencoded otherwise
    /// (including when no content type is declared at all).
    pub(crate) fn negotiate(method: &Method, content_type: Option<&str>) -> Self {
        match *method {
            Method::GET | Method::HEAD => Self::Query,
            _ => match content_type {
                Some(ct) if ct.eq_ignore_ascii_case("application/json") => Self::Json,
                _ => Self::Form,
            },
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Form => "form",
            Self::Query => "query",
            Self::Header => "header",
        })
    }
}

/// The strategies that consume the raw request body.
///
/// Only these may run against the request-scoped body cache, via
/// [`Request::bind_body_with`](crate::Request::bind_body_with): the cache
/// exists so one body can be bound against several destination shapes even
/// though the underlying stream reads once.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BodyBinding {
    /// JSON request body.
    Json,
    /// URL-encoded request body.
    Form,
}

impl BodyBinding {
    /// Decodes `body` into `T` with this strategy's decoder.
    pub(crate) fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T, BindError> {
        match self {
            Self::Json => {
                serde_json::from_slice(body).map_err(|e| BindError::decode(Binding::Json, e))
            }
            Self::Form => {
                serde_urlencoded::from_bytes(body).map_err(|e| BindError::decode(Binding::Form, e))
            }
        }
    }
}

impl From<BodyBinding> for Binding {
    fn from(strategy: BodyBinding) -> Self {
        match strategy {
            BodyBinding::Json => Self::Json,
            BodyBinding::Form => Self::Form,
        }
    }
}

// ── Decoders without a body ───────────────────────────────────────────────────

/// Decodes a raw query string into `T`.
pub(crate) fn decode_query<T: DeserializeOwned>(query: &str) -> Result<T, BindError> {
    serde_urlencoded::from_str(query).map_err(|e| BindError::decode(Binding::Query, e))
}

/// Decodes the header map into `T`.
///
/// Header pairs are re-encoded through the urlencoded serializer and decoded
/// back, so typed fields (numbers, bools) coerce exactly like query
/// parameters. The first value wins for repeated headers; values that are not
/// valid UTF-8 are skipped.
pub(crate) fn decode_headers<T: DeserializeOwned>(headers: &HeaderMap) -> Result<T, BindError> {
    let pairs: Vec<(&str, &str)> = headers
        .keys()
        .filter_map(|name| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| (name.as_str(), value))
        })
        .collect();

    let encoded =
        serde_urlencoded::to_string(pairs).map_err(|e| BindError::decode(Binding::Header, e))?;
    serde_urlencoded::from_str(&encoded).map_err(|e| BindError::decode(Binding::Header, e))
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a bind call failed.
///
/// No retries happen inside the binding layer. Every failure surfaces to the
/// caller uninspected; what to answer the client is the handler's decision.
#[derive(Debug, Error)]
pub enum BindError {
    /// The body stream failed before it was fully read. The body cache is
    /// left unset, so a later bind re-attempts the read.
    #[error("body read failed: {0}")]
    Read(#[source] BoxError),

    /// A strategy could not decode the request into the destination type:
    /// malformed payload, type mismatch, missing field.
    #[error("{strategy} bind failed: {source}")]
    Decode {
        /// The strategy that was executing.
        strategy: Binding,
        source: BoxError,
    },
}

impl BindError {
    fn decode(strategy: Binding, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            strategy,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::header::HeaderValue;
    use serde::Deserialize;

    use super::*;

    #[test]
    fn negotiation_prefers_query_for_bodyless_methods() {
        assert_eq!(Binding::negotiate(&Method::GET, None), Binding::Query);
        assert_eq!(
            Binding::negotiate(&Method::GET, Some("application/json")),
            Binding::Query
        );
        assert_eq!(Binding::negotiate(&Method::HEAD, None), Binding::Query);
    }

    #[test]
    fn negotiation_follows_content_type_for_body_methods() {
        assert_eq!(
            Binding::negotiate(&Method::POST, Some("application/json")),
            Binding::Json
        );
        assert_eq!(
            Binding::negotiate(&Method::PUT, Some("application/json")),
            Binding::Json
        );
        assert_eq!(
            Binding::negotiate(&Method::POST, Some("application/x-www-form-urlencoded")),
            Binding::Form
        );
        assert_eq!(
            Binding::negotiate(&Method::POST, Some("text/plain")),
            Binding::Form
        );
    }

    #[test]
    fn negotiation_defaults_to_form_without_content_type() {
        assert_eq!(Binding::negotiate(&Method::POST, None), Binding::Form);
        assert_eq!(Binding::negotiate(&Method::DELETE, None), Binding::Form);
    }

    #[test]
    fn negotiation_ignores_content_type_case() {
        assert_eq!(
            Binding::negotiate(&Method::POST, Some("Application/JSON")),
            Binding::Json
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Input {
        name: String,
        count: u32,
    }

    #[test]
    fn json_strategy_decodes_body() {
        let input: Input = BodyBinding::Json
            .decode(br#"{"name":"alice","count":3}"#)
            .unwrap();
        assert_eq!(
            input,
            Input {
                name: "alice".into(),
                count: 3
            }
        );
    }

    #[test]
    fn json_strategy_reports_strategy_on_failure() {
        let err = BodyBinding::Json.decode::<Input>(b"not json").unwrap_err();
        match err {
            BindError::Decode { strategy, .. } => assert_eq!(strategy, Binding::Json),
            other => panic!("expected decode error, got {other}"),
        }
    }

    #[test]
    fn form_strategy_coerces_typed_fields() {
        let input: Input = BodyBinding::Form.decode(b"name=alice&count=7").unwrap();
        assert_eq!(input.count, 7);
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        #[serde(rename = "x-page")]
        page: u32,
        #[serde(rename = "x-tag")]
        tag: Option<String>,
    }

    #[test]
    fn header_binding_coerces_typed_fields() {
        let mut headers = HeaderMap::new();
        headers.insert("x-page", HeaderValue::from_static("3"));
        let paging: Paging = decode_headers(&headers).unwrap();
        assert_eq!(paging.page, 3);
        assert_eq!(paging.tag, None);
    }

    #[test]
    fn header_binding_first_value_wins() {
        let mut headers = HeaderMap::new();
        headers.append("x-page", HeaderValue::from_static("1"));
        headers.append("x-page", HeaderValue::from_static("2"));
        let paging: Paging = decode_headers(&headers).unwrap();
        assert_eq!(paging.page, 1);
    }

    #[test]
    fn header_binding_skips_non_utf8_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-page", HeaderValue::from_static("9"));
        headers.insert("x-tag", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());
        let paging: Paging = decode_headers(&headers).unwrap();
        assert_eq!(paging.page, 9);
        assert_eq!(paging.tag, None);
    }

    #[test]
    fn header_binding_percent_roundtrips_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-page", HeaderValue::from_static("4"));
        headers.insert("x-tag", HeaderValue::from_static("a b&c=d"));
        let paging: Paging = decode_headers(&headers).unwrap();
        assert_eq!(paging.tag.unwrap(), "a b&c=d");
    }
}
