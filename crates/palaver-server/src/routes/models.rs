use axum::{response::Json, routing::get, Router};
use serde::Serialize;

/// Models the relay advertises to clients. The default is the newest one.
const MODELS: &[&str] = &["gpt-3.5-turbo", "gpt-4", "gpt-4.1"];
const DEFAULT_MODEL: &str = "gpt-4.1";

#[derive(Debug, Serialize)]
struct ModelsResponse {
    models: Vec<String>,
    default: String,
}

async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: MODELS.iter().map(|m| m.to_string()).collect(),
        default: DEFAULT_MODEL.to_string(),
    })
}

pub fn routes() -> Router {
    Router::new().route("/api/models", get(list_models))
}
