//! Greeting and project-info endpoints

use axum::{Router, extract::Path, routing::get};
use axum_helpers::ApiResponse;
use serde::Serialize;
use utoipa::ToSchema;

pub const TAG: &str = "hello";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub project_name: String,
    pub version: String,
    pub description: String,
    pub features: Vec<String>,
}

impl ProjectInfo {
    fn current() -> Self {
        Self {
            project_name: "Users API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "A RESTful user directory service built on axum".to_string(),
            features: [
                "User management",
                "RESTful API",
                "Layered architecture",
                "Trait-based stores",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/hello/{name}", get(hello_with_name))
        .route("/info", get(info))
}

#[utoipa::path(
    get,
    path = "/hello",
    tag = TAG,
    responses((status = 200, description = "Greeting", body = ApiResponse<String>))
)]
pub async fn hello() -> ApiResponse<String> {
    ApiResponse::success("Hello, Rust!".to_string())
}

#[utoipa::path(
    get,
    path = "/hello/{name}",
    tag = TAG,
    params(("name" = String, Path, description = "Who to greet")),
    responses((status = 200, description = "Personal greeting", body = ApiResponse<String>))
)]
pub async fn hello_with_name(Path(name): Path<String>) -> ApiResponse<String> {
    ApiResponse::success(format!("Hello, {name}! Welcome to the Users API!"))
}

#[utoipa::path(
    get,
    path = "/info",
    tag = TAG,
    responses((status = 200, description = "Project info", body = ApiResponse<ProjectInfo>))
)]
pub async fn info() -> ApiResponse<ProjectInfo> {
    ApiResponse::success_with("Project info retrieved", ProjectInfo::current())
}
