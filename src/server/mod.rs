use crate::context::Context;
use crate::response::{
    Response, internal_service_error, method_not_allowed, resource_not_found,
};
use crate::router::{DispatchError, Router};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::http::request::Parts;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use uuid::Uuid;

const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// The router type served by this boundary.
pub type HttpRouter = Router<HttpRequest>;

/// The context type handed to handlers by this boundary.
pub type HttpContext = Context<HttpRequest>;

/// The raw inbound request exposed through the handler context: the
/// request head plus the fully collected body.
pub struct HttpRequest {
    parts: Parts,
    body: Bytes,
}

impl HttpRequest {
    pub fn method(&self) -> &hyper::Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &hyper::Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &hyper::HeaderMap {
        &self.parts.headers
    }

    /// The collected request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The full request head, for anything not covered by the accessors.
    pub fn parts(&self) -> &Parts {
        &self.parts
    }
}

/// Errors that can occur while starting or running the HTTP server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid listen address '{addr}'.")]
    Address {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("Failed to bind listener on '{addr}'.")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept incoming connection.")]
    Accept {
        #[source]
        source: std::io::Error,
    },
}

impl ServerError {
    #[inline]
    fn address(addr: impl Into<String>, source: std::net::AddrParseError) -> Self {
        Self::Address {
            addr: addr.into(),
            source,
        }
    }

    #[inline]
    const fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind { addr, source }
    }

    #[inline]
    const fn accept(source: std::io::Error) -> Self {
        Self::Accept { source }
    }
}

/// A bare ":port" address listens on all interfaces.
fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Binds the listen address and serves the router until a fatal listener
/// error occurs.
///
/// Each connection is served over HTTP/1 on its own task. Dispatch
/// failures become the standard 404/405 error responses; individual
/// connection errors are logged and never tear down the listener.
///
/// # Arguments
///
/// * `router` - The fully registered router; no further registration
///   happens once serving begins
/// * `addr` - The listen address, either `"host:port"` or `":port"`
pub async fn serve(router: Router<HttpRequest>, addr: &str) -> Result<(), ServerError> {
    let addr = normalize_addr(addr);
    let addr: SocketAddr = addr
        .parse()
        .map_err(|source| ServerError::address(&addr, source))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::bind(addr, source))?;
    log::info!("Server started on: http://{addr}");

    let router = Arc::new(router);

    loop {
        let (stream, remote) = listener.accept().await.map_err(ServerError::accept)?;
        log::trace!("Accepted connection from {remote}");

        let io = TokioIo::new(stream);
        let router = router.clone();
        tokio::task::spawn(async move {
            let service = service_fn(move |request| handle_request(router.clone(), request));
            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .header_read_timeout(HEADER_READ_TIMEOUT)
                .serve_connection(io, service)
                .await
            {
                log::warn!("Error serving connection from {remote}: {err}");
            }
        });
    }
}

async fn handle_request(
    router: Arc<Router<HttpRequest>>,
    request: Request<Incoming>,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let request_id = Uuid::new_v4();
    let path = request.uri().path().to_string();
    let method = request.method().as_str().to_string();

    let response = match router.route(&path, &method) {
        Ok(dispatch) => {
            let (parts, body) = request.into_parts();
            match body.collect().await {
                Ok(collected) => {
                    let raw = HttpRequest {
                        parts,
                        body: collected.to_bytes(),
                    };
                    let (handler, params) = dispatch.into_parts();
                    let context = Context::with_request(params, raw);
                    let response = handler.invoke(context).await;
                    write_response(response.as_ref(), request_id)
                }
                Err(err) => {
                    log::warn!("Failed to read request body for {method} {path}: {err}");
                    write_response(&internal_service_error(err), request_id)
                }
            }
        }
        Err(DispatchError::NotFound { .. }) => write_response(&resource_not_found(), request_id),
        Err(DispatchError::MethodNotAllowed { .. }) => {
            write_response(&method_not_allowed(), request_id)
        }
    };

    log::debug!(
        "{method} {path} -> {status} ({request_id})",
        status = response.status().as_u16()
    );
    Ok(response)
}

/// Marshals a handler response to the wire: JSON body, status code, and
/// the request id header. A body that fails to serialize degrades to a
/// plain 500 with no further detail leaked to the client.
fn write_response(response: &dyn Response, request_id: Uuid) -> hyper::Response<Full<Bytes>> {
    let body = match serde_json::to_vec(&response.body()) {
        Ok(body) => body,
        Err(err) => {
            log::error!("Failed to serialize response body: {err}");
            return plain_internal_error();
        }
    };

    let status = StatusCode::from_u16(response.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut written = hyper::Response::new(Full::new(Bytes::from(body)));
    *written.status_mut() = status;
    written
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        written.headers_mut().insert("x-request-id", value);
    }

    written
}

fn plain_internal_error() -> hyper::Response<Full<Bytes>> {
    let mut response =
        hyper::Response::new(Full::new(Bytes::from_static(b"Internal Service Error")));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::JsonResponse;
    use serde_json::json;

    #[test]
    fn test_bare_port_listens_on_all_interfaces() {
        let addr: SocketAddr = normalize_addr(":8000").parse().unwrap();
        assert_eq!(addr.port(), 8000);
        assert!(addr.ip().is_unspecified());

        let addr: SocketAddr = normalize_addr("127.0.0.1:3000").parse().unwrap();
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_write_response_marshals_status_and_body() {
        let response = JsonResponse::new(201, json!({ "message": "created" }));
        let written = write_response(&response, Uuid::new_v4());

        assert_eq!(written.status(), StatusCode::CREATED);
        assert_eq!(
            written.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(written.headers().get("x-request-id").is_some());
    }

    #[test]
    fn test_write_response_rejects_out_of_range_status() {
        let response = JsonResponse::new(0, json!(null));
        let written = write_response(&response, Uuid::new_v4());
        assert_eq!(written.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
