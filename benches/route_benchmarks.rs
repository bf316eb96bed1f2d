use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use std::pin::Pin;
use tigris::response::{BoxResponse, JsonResponse};
use tigris::{Context, Router};

// Simple benchmarks to aid development of the matcher.

type HandlerFuture = Pin<Box<dyn Future<Output = BoxResponse> + Send>>;

fn dummy_handler() -> impl Fn(Context<()>) -> HandlerFuture + Send + Sync {
    |_context: Context<()>| -> HandlerFuture {
        Box::pin(async move { Box::new(JsonResponse::new(200, json!({}))) as BoxResponse })
    }
}

fn create_populated_router(num_routes: usize) -> Router<()> {
    let mut router = Router::new();
    for i in 0..num_routes {
        router
            .get(&format!("/api/resource{}", i), dummy_handler())
            .unwrap();
        router
            .get(&format!("/api/resource{}/:id", i), dummy_handler())
            .unwrap();
    }
    router
}

fn bench_static_route_hit(c: &mut Criterion) {
    let router = create_populated_router(1000);

    c.bench_function("static_route_hit", |b| {
        b.iter(|| {
            black_box(router.route("/api/resource250", "GET")).ok();
        });
    });
}

fn bench_param_route_hit(c: &mut Criterion) {
    let router = create_populated_router(1000);

    c.bench_function("param_route_hit", |b| {
        b.iter(|| {
            black_box(router.route("/api/resource250/12345", "GET")).ok();
        });
    });
}

fn bench_route_miss(c: &mut Criterion) {
    let router = create_populated_router(1000);

    c.bench_function("route_miss", |b| {
        b.iter(|| {
            black_box(router.route("/api/missing/12345", "GET")).ok();
        });
    });
}

fn bench_method_miss(c: &mut Criterion) {
    let router = create_populated_router(1000);

    c.bench_function("method_miss", |b| {
        b.iter(|| {
            black_box(router.route("/api/resource250", "POST")).ok();
        });
    });
}

criterion_group!(
    benches,
    bench_static_route_hit,
    bench_param_route_hit,
    bench_route_miss,
    bench_method_miss
);
criterion_main!(benches);
