use crate::handler::SharedHandler;
use crate::router::endpoint::{Endpoint, Method, MethodError};
use crate::router::params::Params;
use fnv::FnvBuildHasher;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use thiserror::Error;

/// Errors that can occur while registering routes into the segment tree.
///
/// All of these are returned synchronously at registration time and are
/// expected to be fatal to startup; a misconfigured route set should
/// prevent the server from starting.
#[derive(Error, Debug)]
pub enum RouteError {
    /// Endpoint construction failed because of an invalid or unsupported
    /// HTTP method.
    #[error("Failed to construct endpoint.")]
    Endpoint {
        #[source]
        source: MethodError,
    },

    /// The segment already holds an endpoint for this method.
    #[error("Segment '{segment}' already has an endpoint for method '{method}'.")]
    DuplicateEndpoint { segment: String, method: Method },

    /// The segment already has a parametric child route under a different
    /// parameter name.
    #[error("Segment '{segment}' already has a route with a parameter.")]
    DuplicateParamChild { segment: String },

    /// Two segments with different fragments were merged. This is an
    /// internal precondition violation and should never surface from
    /// correct call sites.
    #[error("May only merge segments with the same path ('{left}' != '{right}').")]
    PathMismatch { left: String, right: String },
}

impl RouteError {
    #[inline]
    pub(crate) const fn endpoint(source: MethodError) -> Self {
        Self::Endpoint { source }
    }

    #[inline]
    pub(crate) fn duplicate_endpoint(segment: impl Into<String>, method: Method) -> Self {
        Self::DuplicateEndpoint {
            segment: segment.into(),
            method,
        }
    }

    #[inline]
    pub(crate) fn duplicate_param_child(segment: impl Into<String>) -> Self {
        Self::DuplicateParamChild {
            segment: segment.into(),
        }
    }

    #[inline]
    pub(crate) fn path_mismatch(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::PathMismatch {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Splits a path into its first fragment and the remainder, ignoring one
/// leading and one trailing slash. The remainder keeps its leading slash
/// so it can be split again on the next level of descent.
fn split_path(path: &str) -> (&str, &str) {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);

    match path.find('/') {
        Some(idx) => (&path[..idx], &path[idx..]),
        None => (path, ""),
    }
}

/// A fragment is a parameter marker when it starts with ':' followed by a
/// non-empty name. A bare ":" is treated as a literal.
fn is_param(fragment: &str) -> bool {
    fragment.len() > 1 && fragment.starts_with(':')
}

fn param_name(fragment: &str) -> &str {
    &fragment[1..]
}

/// One `/`-delimited portion of a URI path, and the trie node representing
/// it.
///
/// Segments form a tree: literal children are kept in a small vector
/// sorted by descending lexicographic fragment order (a determinism
/// guarantee for enumeration, not a matching-priority mechanism), at most
/// one parametric child may exist per node, and endpoints are keyed by
/// HTTP method.
pub struct Segment<M>
where
    M: Send + Sync,
{
    path: String,
    children: Vec<Segment<M>>,
    param_child: Option<Box<Segment<M>>>,
    endpoints: HashMap<Method, Endpoint<M>, FnvBuildHasher>,
}

impl<M> Segment<M>
where
    M: Send + Sync,
{
    fn empty(path: &str) -> Self {
        Self {
            path: path.to_string(),
            children: Vec::new(),
            param_child: None,
            endpoints: HashMap::with_hasher(FnvBuildHasher::default()),
        }
    }

    /// Creates a segment chain for the given path, one node per fragment.
    pub fn new(path: &str) -> Self {
        let (head, tail) = split_path(path);
        let mut segment = Self::empty(head);

        if !tail.is_empty() {
            // A fresh node has exactly one child, so no conflict is possible.
            let child = Segment::new(tail);
            if is_param(&child.path) {
                segment.param_child = Some(Box::new(child));
            } else {
                segment.children.push(child);
            }
        }

        segment
    }

    /// Creates a segment chain for the given path and attaches an endpoint
    /// for `method` at the leaf node.
    ///
    /// # Errors
    ///
    /// Fails when the method token does not name a supported HTTP method.
    pub fn with_endpoint(
        path: &str,
        method: &str,
        handler: SharedHandler<M>,
    ) -> Result<Self, RouteError> {
        let (head, tail) = split_path(path);
        let mut segment = Self::empty(head);

        if !tail.is_empty() {
            let child = Segment::with_endpoint(tail, method, handler)?;
            segment.add_child(child)?;
        } else {
            let endpoint = Endpoint::new(method, handler).map_err(RouteError::endpoint)?;
            segment.add_endpoint(endpoint)?;
        }

        Ok(segment)
    }

    /// The path fragment owned by this segment.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this segment's fragment is a parameter marker.
    pub fn is_parametric(&self) -> bool {
        is_param(&self.path)
    }

    /// Enumerates the segments that exist directly under this one:
    /// literal children in descending fragment order, then the parametric
    /// child if present.
    pub fn children(&self) -> impl Iterator<Item = &Segment<M>> {
        self.children.iter().chain(self.param_child.as_deref())
    }

    /// Gets the endpoint bound to an HTTP method at this segment.
    pub fn endpoint(&self, method: Method) -> Option<&Endpoint<M>> {
        self.endpoints.get(&method)
    }

    /// Whether any endpoint resolves exactly at this segment.
    pub fn has_endpoints(&self) -> bool {
        !self.endpoints.is_empty()
    }

    /// Adds a child segment under this one.
    ///
    /// A parametric child is rejected when one with a different parameter
    /// name already exists; one with the same name is merged, exactly like
    /// a literal child whose fragment collides with an existing child.
    /// Conflicts from deeper levels propagate transitively.
    ///
    /// # Errors
    ///
    /// * [`RouteError::DuplicateParamChild`] - a second, differently named
    ///   parametric child
    /// * [`RouteError::DuplicateEndpoint`] - propagated from a deep merge
    pub fn add_child(&mut self, child: Segment<M>) -> Result<(), RouteError> {
        if is_param(&child.path) {
            if let Some(existing) = self.param_child.take() {
                if existing.path != child.path {
                    self.param_child = Some(existing);
                    return Err(RouteError::duplicate_param_child(&self.path));
                }

                let merged = existing.merge(child)?;
                self.param_child = Some(Box::new(merged));
                return Ok(());
            }

            self.param_child = Some(Box::new(child));
            return Ok(());
        }

        if let Some(idx) = self
            .children
            .iter()
            .position(|existing| existing.path == child.path)
        {
            // Same fragment and same sort key, so the slot stays valid.
            let existing = self.children.remove(idx);
            let merged = existing.merge(child)?;
            self.children.insert(idx, merged);
            return Ok(());
        }

        match self
            .children
            .iter()
            .position(|existing| child.path > existing.path)
        {
            Some(idx) => self.children.insert(idx, child),
            None => self.children.push(child),
        }

        Ok(())
    }

    /// Adds an endpoint that resolves exactly at this segment.
    ///
    /// # Errors
    ///
    /// * [`RouteError::DuplicateEndpoint`] - the method is already bound
    pub fn add_endpoint(&mut self, endpoint: Endpoint<M>) -> Result<(), RouteError> {
        match self.endpoints.entry(endpoint.method()) {
            Entry::Occupied(slot) => {
                Err(RouteError::duplicate_endpoint(&self.path, *slot.key()))
            }
            Entry::Vacant(slot) => {
                slot.insert(endpoint);
                Ok(())
            }
        }
    }

    /// Combines two segments with identical root fragments into one,
    /// folding both sides' children and endpoints into a fresh tree.
    ///
    /// The result is order-independent for non-conflicting inputs; the
    /// fold order (`self` first) only affects which side a conflict error
    /// is attributed to.
    ///
    /// # Errors
    ///
    /// * [`RouteError::PathMismatch`] - the root fragments differ
    /// * [`RouteError::DuplicateEndpoint`] / [`RouteError::DuplicateParamChild`] -
    ///   the subtrees bind conflicting routes
    pub fn merge(self, other: Segment<M>) -> Result<Segment<M>, RouteError> {
        if self.path != other.path {
            return Err(RouteError::path_mismatch(self.path, other.path));
        }

        let mut merged = Segment::new(&self.path);

        for child in self.children {
            merged.add_child(child)?;
        }
        if let Some(param_child) = self.param_child {
            merged.add_child(*param_child)?;
        }
        for child in other.children {
            merged.add_child(child)?;
        }
        if let Some(param_child) = other.param_child {
            merged.add_child(*param_child)?;
        }

        for endpoint in self.endpoints.into_values() {
            merged.add_endpoint(endpoint)?;
        }
        for endpoint in other.endpoints.into_values() {
            merged.add_endpoint(endpoint)?;
        }

        Ok(merged)
    }

    /// Checks a request path against this segment and its descendants.
    ///
    /// Matching mirrors construction: the head fragment must equal this
    /// segment's fragment, or this segment must be parametric (any
    /// non-empty head is accepted and bound). An exhausted tail makes this
    /// node the candidate leaf regardless of whether an endpoint is bound
    /// here; endpoint lookup happens at the router. Literal children are
    /// tried before the parametric child, giving literal segments match
    /// priority at the same depth. Parameters accumulate outermost-first.
    pub fn matches<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a, M>> {
        let (head, tail) = split_path(path);

        if is_param(&self.path) {
            if head.is_empty() {
                return None;
            }
        } else if head != self.path {
            return None;
        }

        if tail.is_empty() {
            let mut result = RouteMatch::new(self, path);
            if is_param(&self.path) {
                result.params.push(param_name(&self.path), head);
            }
            return Some(result);
        }

        for child in &self.children {
            if let Some(mut result) = child.matches(tail) {
                result.request_uri = path;
                if is_param(&self.path) {
                    result.params.push_front(param_name(&self.path), head);
                }
                return Some(result);
            }
        }

        if let Some(param_child) = &self.param_child {
            if let Some(mut result) = param_child.matches(tail) {
                result.request_uri = path;
                if is_param(&self.path) {
                    result.params.push_front(param_name(&self.path), head);
                }
                return Some(result);
            }
        }

        None
    }
}

/// The data produced when a request path matches a segment chain: the
/// terminal segment, the consumed request path, and the parameters
/// extracted along the way. Constructed fresh per request and discarded
/// after the handler returns.
pub struct RouteMatch<'a, M>
where
    M: Send + Sync,
{
    segment: &'a Segment<M>,
    request_uri: &'a str,
    params: Params,
}

impl<'a, M> RouteMatch<'a, M>
where
    M: Send + Sync,
{
    fn new(segment: &'a Segment<M>, request_uri: &'a str) -> Self {
        Self {
            segment,
            request_uri,
            params: Params::new(),
        }
    }

    /// The terminal segment the path resolved to.
    pub fn segment(&self) -> &'a Segment<M> {
        self.segment
    }

    /// The request path consumed by the match.
    pub fn request_uri(&self) -> &str {
        self.request_uri
    }

    /// The parameters extracted from the path, outermost first.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub(crate) fn into_params(self) -> Params {
        self.params
    }
}
