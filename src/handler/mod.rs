use crate::context::Context;
use crate::response::BoxResponse;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Shared, dynamically dispatched handler as stored by the router.
pub type SharedHandler<M> = Arc<dyn Handler<M>>;

/// A capability invoked when a request matches the endpoint it is bound
/// to.
///
/// `M` is the raw request type exposed through the [`Context`].
/// Implementations may be closures, functions, or objects; the router only
/// requires the single `invoke` operation.
#[async_trait]
pub trait Handler<M>: Send + Sync
where
    M: Send + Sync,
{
    async fn invoke(&self, context: Context<M>) -> BoxResponse;
}

#[async_trait]
impl<M, F, Fut> Handler<M> for F
where
    M: Send + Sync + 'static,
    F: Fn(Context<M>) -> Fut + Send + Sync,
    Fut: Future<Output = BoxResponse> + Send + 'static,
{
    async fn invoke(&self, context: Context<M>) -> BoxResponse {
        (self)(context).await
    }
}
