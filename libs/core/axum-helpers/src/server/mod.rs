//! Server infrastructure module.
//!
//! ```ignore
//! use axum_helpers::server::{create_app, create_router, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes)
//!     .merge(health_router(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
//! create_app(router, &server_config).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_app, create_router};
pub use health::{HealthResponse, health_router};
pub use shutdown::shutdown_signal;
