pub mod context;
pub mod handler;
pub mod payload;
pub mod response;
pub mod router;
#[cfg(feature = "hyper")]
pub mod server;

pub use context::Context;
pub use handler::{Handler, SharedHandler};
pub use payload::Payload;
pub use response::{BoxResponse, ErrorResponse, JsonResponse, Response};
pub use router::endpoint::{Endpoint, Method, MethodError};
pub use router::params::Params;
pub use router::segment::{RouteError, RouteMatch, Segment};
pub use router::{Dispatch, DispatchError, Router};
