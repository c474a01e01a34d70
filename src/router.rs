//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. No middleware stack, no
//! reflection. You register a path, you get a handler. That is all.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};

/// The application router.
///
/// One radix tree per HTTP method, no allocations on the lookup hot path.
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self`, so routes chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use kata::{Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// # async fn delete_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::DELETE, "/users/{id}", delete_user)
    ///     .get("/users/{id}", get_user)
    ///     .post("/users", create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting path pattern. Routes register at
    /// startup, so this surfaces before the server accepts traffic.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Shortcut for [`on`](Router::on) with [`Method::GET`].
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    /// Shortcut for [`on`](Router::on) with [`Method::POST`].
    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    /// Shortcut for [`on`](Router::on) with [`Method::PUT`].
    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    /// Shortcut for [`on`](Router::on) with [`Method::DELETE`].
    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Shortcut for [`on`](Router::on) with [`Method::PATCH`].
    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::response::Response;

    async fn noop(_req: Request) -> Response {
        Response::text("ok")
    }

    #[test]
    fn lookup_hit_captures_params() {
        let router = Router::new().get("/users/{id}", noop);
        let (_, params) = router.lookup(&Method::GET, "/users/42").unwrap();
        assert_eq!(params.get("id").unwrap(), "42");
    }

    #[test]
    fn lookup_miss_on_unknown_path() {
        let router = Router::new().get("/users", noop);
        assert!(router.lookup(&Method::GET, "/orders").is_none());
    }

    #[test]
    fn lookup_miss_on_method_mismatch() {
        let router = Router::new().get("/users", noop);
        assert!(router.lookup(&Method::POST, "/users").is_none());
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics_at_registration() {
        let _ = Router::new().get("/users/{id}", noop).get("/users/{id}", noop);
    }
}
