pub mod endpoint;
pub mod params;
pub mod segment;

use crate::handler::{Handler, SharedHandler};
use crate::router::endpoint::Method;
use crate::router::params::Params;
use crate::router::segment::{RouteError, Segment};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced while dispatching a request.
///
/// Unlike [`RouteError`], these are never fatal: the boundary layer
/// converts them to the corresponding standard HTTP error response and the
/// server continues serving subsequent requests.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No segment chain terminates at the request path.
    #[error("No route matches path '{path}'.")]
    NotFound { path: String },

    /// The path matches a route, but no endpoint is bound for the request
    /// method.
    #[error("Path '{path}' does not allow method '{method}'.")]
    MethodNotAllowed { path: String, method: String },
}

impl DispatchError {
    #[inline]
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    #[inline]
    pub(crate) fn method_not_allowed(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            path: path.into(),
            method: method.into(),
        }
    }
}

/// The outcome of a successful dispatch: the handler bound to the matched
/// endpoint and the parameters extracted from the request path.
pub struct Dispatch<M>
where
    M: Send + Sync,
{
    handler: SharedHandler<M>,
    params: Params,
}

impl<M> Dispatch<M>
where
    M: Send + Sync,
{
    /// The handler to invoke for this request.
    pub fn handler(&self) -> &SharedHandler<M> {
        &self.handler
    }

    /// The parameters extracted during matching, outermost first.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Consumes the dispatch, yielding the handler and parameters.
    pub fn into_parts(self) -> (SharedHandler<M>, Params) {
        (self.handler, self.params)
    }
}

/// The basic foundation of the HTTP server: a set of top-level segment
/// trees, one per distinct first path fragment.
///
/// Routes are registered up front, then the router is shared immutably
/// across requests (`Arc<Router<M>>` in the server boundary). Registration
/// merges each new single-route chain into the existing tree for the same
/// first fragment, so independently registered routes that share a prefix
/// end up as branches of one tree.
pub struct Router<M>
where
    M: Send + Sync,
{
    roots: Vec<Segment<M>>,
}

impl<M> Default for Router<M>
where
    M: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Router<M>
where
    M: Send + Sync,
{
    /// Creates a new router with no registered routes.
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    /// Registers a handler for a GET request on the matching path.
    pub fn get(&mut self, path: &str, handler: impl Handler<M> + 'static) -> Result<(), RouteError> {
        self.register(path, Method::Get.as_str(), handler)
    }

    /// Registers a handler for a POST request on the matching path.
    pub fn post(
        &mut self,
        path: &str,
        handler: impl Handler<M> + 'static,
    ) -> Result<(), RouteError> {
        self.register(path, Method::Post.as_str(), handler)
    }

    /// Registers a handler for a PUT request on the matching path.
    pub fn put(&mut self, path: &str, handler: impl Handler<M> + 'static) -> Result<(), RouteError> {
        self.register(path, Method::Put.as_str(), handler)
    }

    /// Registers a handler for a PATCH request on the matching path.
    pub fn patch(
        &mut self,
        path: &str,
        handler: impl Handler<M> + 'static,
    ) -> Result<(), RouteError> {
        self.register(path, Method::Patch.as_str(), handler)
    }

    /// Registers a handler for a DELETE request on the matching path.
    pub fn delete(
        &mut self,
        path: &str,
        handler: impl Handler<M> + 'static,
    ) -> Result<(), RouteError> {
        self.register(path, Method::Delete.as_str(), handler)
    }

    /// Registers a handler for the given path pattern and HTTP method.
    ///
    /// Path segments are separated by `/`; a segment prefixed with `:`
    /// denotes a named capture, all other segments are literal.
    ///
    /// # Arguments
    ///
    /// * `path` - The path pattern to match
    /// * `method` - The HTTP method token, e.g. `"GET"`
    /// * `handler` - The handler to invoke on a match
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when the method is invalid or unsupported,
    /// or when the route conflicts with an already registered one. These
    /// errors are expected to be fatal to startup.
    pub fn register(
        &mut self,
        path: &str,
        method: &str,
        handler: impl Handler<M> + 'static,
    ) -> Result<(), RouteError> {
        self.register_shared(path, method, Arc::new(handler))
    }

    fn register_shared(
        &mut self,
        path: &str,
        method: &str,
        handler: SharedHandler<M>,
    ) -> Result<(), RouteError> {
        log::trace!("Registering route: {path}@{method}");
        let chain = Segment::with_endpoint(path, method, handler)?;

        if let Some(idx) = self
            .roots
            .iter()
            .position(|root| root.path() == chain.path())
        {
            let existing = self.roots.remove(idx);
            let merged = existing.merge(chain)?;
            self.roots.insert(idx, merged);
            return Ok(());
        }

        match self
            .roots
            .iter()
            .position(|root| chain.path() > root.path())
        {
            Some(idx) => self.roots.insert(idx, chain),
            None => self.roots.push(chain),
        }

        Ok(())
    }

    /// Enumerates the top-level segment trees in deterministic order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment<M>> {
        self.roots.iter()
    }

    /// Resolves a request path and method to the handler that should
    /// serve it.
    ///
    /// The roots are walked in deterministic order and the first
    /// structural match wins. A structural match on a segment that holds
    /// no endpoints at all is reported as [`DispatchError::NotFound`]; a
    /// segment with endpoints but none for this method (including an
    /// unrecognizable method token) is
    /// [`DispatchError::MethodNotAllowed`].
    ///
    /// # Arguments
    ///
    /// * `path` - The request path, e.g. `"/products/42"`
    /// * `method` - The request method token, e.g. `"GET"`
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatch)` - The bound handler and the extracted parameters
    /// * `Err(DispatchError)` - The failure to convert to an HTTP error
    pub fn route(&self, path: &str, method: &str) -> Result<Dispatch<M>, DispatchError> {
        let Some(matched) = self.roots.iter().find_map(|root| root.matches(path)) else {
            log::trace!("No structural match for: {path}");
            return Err(DispatchError::not_found(path));
        };

        if !matched.segment().has_endpoints() {
            log::trace!("Matched segment for '{path}' has no endpoints");
            return Err(DispatchError::not_found(path));
        }

        let endpoint = Method::from_str(method)
            .ok()
            .and_then(|parsed| matched.segment().endpoint(parsed));

        match endpoint {
            Some(endpoint) => {
                log::trace!("Dispatching: {path}@{method}");
                Ok(Dispatch {
                    handler: endpoint.handler().clone(),
                    params: matched.into_params(),
                })
            }
            None => Err(DispatchError::method_not_allowed(path, method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::response::{BoxResponse, JsonResponse};
    use serde_json::json;

    type HandlerFuture = std::pin::Pin<Box<dyn Future<Output = BoxResponse> + Send>>;

    fn named_handler(name: &'static str) -> impl Fn(Context<()>) -> HandlerFuture + Send + Sync {
        move |context: Context<()>| -> HandlerFuture {
            Box::pin(async move {
                let id = context.param("id").map(str::to_string);
                Box::new(JsonResponse::new(200, json!({ "handler": name, "id": id })))
                    as BoxResponse
            })
        }
    }

    async fn dispatch_body(
        router: &Router<()>,
        path: &str,
        method: &str,
    ) -> Result<serde_json::Value, DispatchError> {
        let dispatch = router.route(path, method)?;
        let (handler, params) = dispatch.into_parts();
        let response = handler.invoke(Context::new(params)).await;
        Ok(response.body())
    }

    #[tokio::test]
    async fn test_literal_round_trip() {
        let mut router = Router::new();
        router.get("/hello", named_handler("hello")).unwrap();

        let body = dispatch_body(&router, "/hello", "GET").await.unwrap();
        assert_eq!(body["handler"], "hello");
        assert_eq!(body["id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_trailing_slash_routes_identically() {
        let mut router = Router::new();
        router.get("/products", named_handler("products")).unwrap();

        let with_slash = dispatch_body(&router, "/products/", "GET").await.unwrap();
        let without = dispatch_body(&router, "/products", "GET").await.unwrap();
        assert_eq!(with_slash, without);
    }

    #[tokio::test]
    async fn test_param_dispatch() {
        let mut router = Router::new();
        router.get("/products/:id", named_handler("show")).unwrap();

        let body = dispatch_body(&router, "/products/42", "GET").await.unwrap();
        assert_eq!(body["handler"], "show");
        assert_eq!(body["id"], "42");
    }

    #[test]
    fn test_undershoot_is_not_found() {
        let mut router = Router::new();
        router.get("/products/:id", named_handler("show")).unwrap();

        assert!(matches!(
            router.route("/products", "GET"),
            Err(DispatchError::NotFound { .. })
        ));
        assert!(matches!(
            router.route("/products/", "GET"),
            Err(DispatchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_overshoot_is_not_found() {
        let mut router = Router::new();
        router.get("/products/:id", named_handler("show")).unwrap();

        assert!(matches!(
            router.route("/products/1/edit", "GET"),
            Err(DispatchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_method_not_allowed_is_distinct_from_not_found() {
        let mut router = Router::new();
        router.get("/products", named_handler("list")).unwrap();

        assert!(matches!(
            router.route("/products", "POST"),
            Err(DispatchError::MethodNotAllowed { .. })
        ));
        assert!(matches!(
            router.route("/missing", "POST"),
            Err(DispatchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_unrecognized_request_method_is_method_not_allowed() {
        let mut router = Router::new();
        router.get("/products", named_handler("list")).unwrap();

        // A HEAD request names a real path that cannot serve it.
        assert!(matches!(
            router.route("/products", "HEAD"),
            Err(DispatchError::MethodNotAllowed { .. })
        ));
    }

    #[tokio::test]
    async fn test_literal_precedence_over_param() {
        let mut router = Router::new();
        router.get("/products/new", named_handler("new")).unwrap();
        router.get("/products/:id", named_handler("show")).unwrap();

        let body = dispatch_body(&router, "/products/new", "GET").await.unwrap();
        assert_eq!(body["handler"], "new");

        let body = dispatch_body(&router, "/products/42", "GET").await.unwrap();
        assert_eq!(body["handler"], "show");
    }

    #[tokio::test]
    async fn test_registration_order_is_irrelevant() {
        let routes: [(&str, &'static str); 3] = [
            ("/products/new", "new"),
            ("/products/:id", "show"),
            ("/products/:id/edit", "edit"),
        ];

        let mut forward = Router::new();
        for (path, name) in routes {
            forward.get(path, named_handler(name)).unwrap();
        }
        let mut reverse = Router::new();
        for (path, name) in routes.into_iter().rev() {
            reverse.get(path, named_handler(name)).unwrap();
        }

        for router in [&forward, &reverse] {
            for (path, expected) in [
                ("/products/new", "new"),
                ("/products/9", "show"),
                ("/products/9/edit", "edit"),
            ] {
                let body = dispatch_body(router, path, "GET").await.unwrap();
                assert_eq!(body["handler"], expected);
            }
        }
    }

    #[tokio::test]
    async fn test_nested_param_ordering() {
        let mut router = Router::new();
        router
            .get("/orgs/:org/repos/:repo", |context: Context<()>| async move {
                let ordered: Vec<String> = context
                    .params()
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect();
                Box::new(JsonResponse::new(200, json!({ "ordered": ordered }))) as BoxResponse
            })
            .unwrap();

        let body = dispatch_body(&router, "/orgs/acme/repos/widget", "GET")
            .await
            .unwrap();
        assert_eq!(body["ordered"], json!(["org=acme", "repo=widget"]));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut router = Router::new();
        router.get("/products", named_handler("first")).unwrap();

        assert!(matches!(
            router.get("/products", named_handler("second")),
            Err(RouteError::DuplicateEndpoint { .. })
        ));
    }

    #[test]
    fn test_conflicting_param_names_fail() {
        let mut router = Router::new();
        router.get("/products/:id", named_handler("first")).unwrap();

        assert!(matches!(
            router.post("/products/:product_id", named_handler("second")),
            Err(RouteError::DuplicateParamChild { .. })
        ));
    }

    #[test]
    fn test_unsupported_method_registration_fails() {
        let mut router = Router::new();
        assert!(matches!(
            router.register("/products", "OPTIONS", named_handler("list")),
            Err(RouteError::Endpoint { .. })
        ));
        assert!(matches!(
            router.register("/products", "FETCH", named_handler("list")),
            Err(RouteError::Endpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_root_path_registration() {
        let mut router = Router::new();
        router.get("/", named_handler("root")).unwrap();

        let body = dispatch_body(&router, "/", "GET").await.unwrap();
        assert_eq!(body["handler"], "root");
    }

    #[tokio::test]
    async fn test_methods_on_same_path_share_one_tree() {
        let mut router = Router::new();
        router.get("/products", named_handler("list")).unwrap();
        router.post("/products", named_handler("create")).unwrap();
        router.delete("/products/:id", named_handler("destroy")).unwrap();

        assert_eq!(router.segments().count(), 1);

        let body = dispatch_body(&router, "/products", "POST").await.unwrap();
        assert_eq!(body["handler"], "create");
        let body = dispatch_body(&router, "/products/3", "DELETE").await.unwrap();
        assert_eq!(body["handler"], "destroy");
    }
}
