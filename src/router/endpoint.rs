use crate::handler::SharedHandler;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while validating an HTTP method during endpoint
/// construction.
#[derive(Error, Debug)]
pub enum MethodError {
    /// The method string is not a recognized HTTP method token.
    #[error("'{method}' is not a valid HTTP method.")]
    InvalidMethod { method: String },

    /// The method is a recognized HTTP method but is not supported for
    /// endpoint registration.
    #[error("HTTP method '{method}' is not currently supported as an HTTP endpoint.")]
    UnsupportedMethod { method: String },
}

impl MethodError {
    #[inline]
    pub(crate) fn invalid_method(method: impl Into<String>) -> Self {
        Self::InvalidMethod {
            method: method.into(),
        }
    }

    #[inline]
    pub(crate) fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }
}

/// The HTTP methods an endpoint can be registered for.
///
/// `CONNECT`, `HEAD`, `OPTIONS` and `TRACE` are recognized methods but are
/// excluded from registration; parsing them yields
/// [`MethodError::UnsupportedMethod`] so callers can distinguish them from
/// arbitrary garbage tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = MethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "CONNECT" | "HEAD" | "OPTIONS" | "TRACE" => Err(MethodError::unsupported_method(s)),
            _ => Err(MethodError::invalid_method(s)),
        }
    }
}

/// The leaf value on the segment tree that corresponds to an actual
/// endpoint reachable via an HTTP request: an HTTP method paired with the
/// handler to call when a request matches.
pub struct Endpoint<M>
where
    M: Send + Sync,
{
    method: Method,
    handler: SharedHandler<M>,
}

impl<M> Endpoint<M>
where
    M: Send + Sync,
{
    /// Creates a new, valid endpoint based on an HTTP method token.
    ///
    /// # Errors
    ///
    /// Fails with [`MethodError::InvalidMethod`] for unrecognized tokens
    /// and [`MethodError::UnsupportedMethod`] for recognized methods that
    /// are excluded from the supported set.
    pub fn new(method: &str, handler: SharedHandler<M>) -> Result<Self, MethodError> {
        let method = Method::from_str(method)?;
        Ok(Self { method, handler })
    }

    /// The HTTP method this endpoint responds to.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The handler to call when a request matches this endpoint.
    pub fn handler(&self) -> &SharedHandler<M> {
        &self.handler
    }
}
