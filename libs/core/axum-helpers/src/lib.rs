//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! ## Modules
//!
//! - **[`envelope`]**: The `{code, message, data, timestamp}` response envelope
//! - **[`errors`]**: `AppError` and its envelope-shaped HTTP rendering
//! - **[`extractors`]**: Validated JSON, query string and numeric id extractors
//! - **[`audit`]**: Fire-and-forget request audit records and middleware
//! - **[`http`]**: CORS layer
//! - **[`server`]**: Router assembly, health endpoint, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_app, create_router};
//! use core_config::server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes);
//!     create_app(router, &ServerConfig::default()).await
//! }
//! ```

pub mod audit;
pub mod envelope;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use audit::{
    AuditDispatcher, AuditError, AuditSink, AuditState, RequestAuditRecord, TracingAuditSink,
    extract_client_ip, extract_user_id, request_audit,
};
pub use envelope::ApiResponse;
pub use errors::{AppError, AppResult};
pub use extractors::{IdPath, QueryParams, ValidatedJson};
pub use http::create_api_cors_layer;
pub use server::{create_app, create_router, health_router, shutdown_signal};
