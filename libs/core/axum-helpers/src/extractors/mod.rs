//! Custom extractors for Axum handlers.
//!
//! All of them reject with [`crate::AppError`], so failures come back as envelopes.

pub mod id_path;
pub mod query_params;
pub mod validated_json;

pub use id_path::IdPath;
pub use query_params::QueryParams;
pub use validated_json::ValidatedJson;
