use axum::Router;
use domain_users::{UserDirectory, handlers};

use crate::state::Storage;

/// Users router over whichever store was selected at startup
pub fn router(storage: &Storage) -> Router {
    match storage.clone() {
        Storage::Memory(store) => handlers::router(UserDirectory::new(store)),
        Storage::Postgres(store) => handlers::router(UserDirectory::new(store)),
    }
}
