//! Users Domain
//!
//! User directory with uniqueness rules on username and email.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, envelope responses
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Directory  │  ← Validation, uniqueness pre-checks, timestamps
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │    Store    │  ← Data access (trait + in-memory / PostgreSQL)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entity, DTOs, paging
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{handlers, InMemoryUserStore, UserDirectory};
//!
//! let directory = UserDirectory::new(InMemoryUserStore::new());
//! let router = handlers::router(directory);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use models::{CreateUserRequest, PageQuery, UpdateUserRequest, User, UserPage};
pub use postgres::PgUserStore;
pub use repository::{InMemoryUserStore, UserStore};
pub use service::UserDirectory;
