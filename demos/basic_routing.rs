use serde::Deserialize;
use serde_json::json;
use tigris::payload::{self, Payload};
use tigris::response::{BoxResponse, ErrorResponse, JsonResponse, bad_request};
use tigris::server::{HttpContext, HttpRouter, serve};
use tigris::Router;

#[derive(Deserialize)]
struct CreateProduct {
    name: String,
}

impl Payload for CreateProduct {
    fn validate(&self) -> Result<(), ErrorResponse> {
        if self.name.is_empty() {
            return Err(bad_request("10001", "name must not be empty"));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut router: HttpRouter = Router::new();

    router.get("/hello", |_context: HttpContext| async move {
        Box::new(JsonResponse::new(200, json!({ "message": "hello" }))) as BoxResponse
    })?;

    router.get("/world", |_context: HttpContext| async move {
        Box::new(JsonResponse::new(200, json!({ "message": "world" }))) as BoxResponse
    })?;

    router.get("/products/:id", |context: HttpContext| async move {
        let id = context.param("id").unwrap_or_default();
        let message = format!("Found product {id}");
        Box::new(JsonResponse::new(200, json!({ "message": message }))) as BoxResponse
    })?;

    router.get("/products/:id/edit", |context: HttpContext| async move {
        let id = context.param("id").unwrap_or_default();
        let message = format!("Editing product {id}");
        Box::new(JsonResponse::new(200, json!({ "message": message }))) as BoxResponse
    })?;

    router.post("/products", |context: HttpContext| async move {
        let body = context
            .request()
            .map(|request| request.body().as_ref())
            .unwrap_or_default();

        match payload::parse::<CreateProduct>(body) {
            Ok(product) => {
                let message = format!("Created product {}", product.name);
                Box::new(JsonResponse::new(201, json!({ "message": message }))) as BoxResponse
            }
            Err(err) => Box::new(err) as BoxResponse,
        }
    })?;

    println!("Available endpoints:");
    println!("  GET  /hello");
    println!("  GET  /world");
    println!("  GET  /products/:id");
    println!("  GET  /products/:id/edit");
    println!("  POST /products");
    println!();
    println!("Examples:");
    println!("  curl http://127.0.0.1:8000/hello");
    println!("  curl http://127.0.0.1:8000/products/42");
    println!("  curl -X POST -d '{{\"name\":\"widget\"}}' http://127.0.0.1:8000/products");

    serve(router, ":8000").await?;
    Ok(())
}
