use database::postgres::DatabaseConnection;
use domain_users::{InMemoryUserStore, PgUserStore};

/// Backing store chosen at startup
#[derive(Clone)]
pub enum Storage {
    Memory(InMemoryUserStore),
    Postgres(PgUserStore),
}

impl Storage {
    pub fn memory() -> Self {
        Storage::Memory(InMemoryUserStore::new())
    }

    pub fn postgres(db: DatabaseConnection) -> Self {
        Storage::Postgres(PgUserStore::new(db))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Storage::Memory(_) => "in-memory",
            Storage::Postgres(_) => "postgres",
        }
    }
}
