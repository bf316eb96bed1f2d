use crate::router::params::Params;

/// The information needed to interpret and interact with the contents of
/// an HTTP request.
///
/// A context is created per request after routing succeeds and is handed
/// to the matched handler. It carries the path parameters extracted during
/// matching and the raw inbound request value supplied by the boundary
/// layer (`M` is the boundary's request type; tests typically use `()`).
pub struct Context<M> {
    params: Params,
    request: Option<M>,
}

impl<M> Context<M>
where
    M: Send + Sync,
{
    pub(crate) fn new(params: Params) -> Self {
        Self {
            params,
            request: None,
        }
    }

    pub(crate) fn with_request(params: Params, request: M) -> Self {
        Self {
            params,
            request: Some(request),
        }
    }

    /// Gets the value of a URL parameter based on its name. Returns `None`
    /// when no parameter with that name exists in the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// All parameters extracted from the request path, outermost first.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The raw inbound request, when the boundary layer attached one.
    pub fn request(&self) -> Option<&M> {
        self.request.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_lookup() {
        let mut params = Params::new();
        params.push("id", "42");

        let context: Context<()> = Context::new(params);
        assert_eq!(context.param("id"), Some("42"));
        assert_eq!(context.param("missing"), None);
        assert!(context.request().is_none());
    }

    #[test]
    fn test_request_access() {
        let context = Context::with_request(Params::new(), String::from("raw request"));
        assert_eq!(context.request().map(String::as_str), Some("raw request"));
    }
}
