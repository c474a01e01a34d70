//! Server-level error type.

use thiserror::Error;

/// The error type returned by [`Server::serve`](crate::Server::serve).
///
/// Application-level outcomes (404s, failure envelopes) are expressed as
/// [`Response`](crate::Response) values, not as `Error`s, and binding
/// failures surface as [`BindError`](crate::BindError). This type carries
/// infrastructure failures only: binding to a port or accepting a connection.
#[derive(Debug, Error)]
#[error("io: {0}")]
pub struct Error(#[from] std::io::Error);
