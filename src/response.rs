use serde_json::{Value, json};
use thiserror::Error;

/// The representation of an HTTP response produced by a handler.
///
/// The boundary layer serializes `body()` to JSON and writes it together
/// with `status_code()` to the transport. Implementations must be safe to
/// move across task boundaries.
pub trait Response: Send + Sync {
    /// The contents that should be returned in the HTTP response body.
    fn body(&self) -> Value;

    /// The status code that should be used in the HTTP response.
    fn status_code(&self) -> u16;
}

/// Boxed response returned by handlers.
pub type BoxResponse = Box<dyn Response>;

/// A simple response carrying a status code and a JSON body.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    body: Value,
    status: u16,
}

impl JsonResponse {
    /// Creates a new `JsonResponse` with the given status code and body.
    pub fn new(status: u16, body: Value) -> Self {
        Self { body, status }
    }
}

impl Response for JsonResponse {
    fn body(&self) -> Value {
        self.body.clone()
    }

    fn status_code(&self) -> u16 {
        self.status
    }
}

/// An opinionated structure for how errors are represented in an API: a
/// status, a stable machine-readable code, a human-readable message, and
/// optionally a link to further documentation.
///
/// `ErrorResponse` implements `Response` so it can be written directly to
/// the transport, and `std::error::Error` so services can return it like
/// any other error. The internal message is never written to the client.
#[derive(Error, Debug, Clone)]
#[error("{internal_message}")]
pub struct ErrorResponse {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub internal_message: String,
    pub more_info: String,
}

impl Response for ErrorResponse {
    fn body(&self) -> Value {
        let mut body = json!({
            "status": self.status,
            "code": self.code,
            "message": self.message,
        });

        if !self.more_info.is_empty() {
            body["more_info"] = Value::String(self.more_info.clone());
        }

        body
    }

    fn status_code(&self) -> u16 {
        self.status
    }
}

/// Returns an error response for when an unexpected error occurs.
pub fn internal_service_error(err: impl std::fmt::Display) -> ErrorResponse {
    ErrorResponse {
        status: 500,
        code: String::from("00001"),
        message: String::from("An unknown error occurred"),
        internal_message: err.to_string(),
        more_info: String::new(),
    }
}

/// Returns the error response for a 404 caused by a route that is not
/// registered.
pub fn resource_not_found() -> ErrorResponse {
    const MSG: &str = "Requested resource is not found";

    ErrorResponse {
        status: 404,
        code: String::from("00002"),
        message: String::from(MSG),
        internal_message: String::from(MSG),
        more_info: String::new(),
    }
}

/// Returns the error response for a request whose path matches a route but
/// whose HTTP method has no bound endpoint.
pub fn method_not_allowed() -> ErrorResponse {
    const MSG: &str = "Method not allowed";

    ErrorResponse {
        status: 405,
        code: String::from("00003"),
        message: String::from(MSG),
        internal_message: String::from(MSG),
        more_info: String::new(),
    }
}

/// Returns a 400 Bad Request error response. The general guidance is to use
/// this when a request is malformed for some reason.
pub fn bad_request(code: impl Into<String>, err: impl std::fmt::Display) -> ErrorResponse {
    let message = err.to_string();

    ErrorResponse {
        status: 400,
        code: code.into(),
        message: message.clone(),
        internal_message: message,
        more_info: String::new(),
    }
}

/// Returns the error response for a JSON payload that fails to parse.
pub fn malformed_json(err: impl std::fmt::Display) -> ErrorResponse {
    bad_request("00004", err)
}

/// Returns an error response for an entity that is not found while
/// processing a request, when the result should be signified with a 404.
pub fn entity_not_found(code: impl Into<String>, err: impl std::fmt::Display) -> ErrorResponse {
    let message = err.to_string();

    ErrorResponse {
        status: 404,
        code: code.into(),
        message: message.clone(),
        internal_message: message,
        more_info: String::new(),
    }
}
