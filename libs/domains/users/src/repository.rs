use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Physical storage for users.
///
/// Write methods report rows affected. Lookups return `None` for missing
/// rows rather than an error. Implementations must reject a write that
/// would give two users the same username or email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user, assigning `user.id` on success
    async fn insert(&self, user: &mut User) -> UserResult<u64>;

    async fn select_by_id(&self, id: i64) -> UserResult<Option<User>>;

    async fn select_by_username(&self, username: &str) -> UserResult<Option<User>>;

    async fn select_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn select_all(&self) -> UserResult<Vec<User>>;

    /// Overwrite the row matching `user.id`
    async fn update(&self, user: &User) -> UserResult<u64>;

    async fn delete_by_id(&self, id: i64) -> UserResult<u64>;

    async fn count_by_username(&self, username: &str) -> UserResult<u64>;

    async fn count_by_email(&self, email: &str) -> UserResult<u64>;

    async fn select_by_page(&self, offset: u64, limit: u64) -> UserResult<Vec<User>>;

    async fn count_total(&self) -> UserResult<u64>;
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, User>,
    last_id: i64,
}

impl Table {
    /// Uniqueness check against every row except `skip_id`
    fn check_unique(&self, user: &User, skip_id: Option<i64>) -> UserResult<()> {
        let mut others = self.rows.values().filter(|row| row.id != skip_id);
        if others.clone().any(|row| row.username == user.username) {
            return Err(UserError::DuplicateUsername(user.username.clone()));
        }
        if others.any(|row| row.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email.clone()));
        }
        Ok(())
    }
}

/// In-memory implementation of UserStore (for development/testing)
///
/// Ids increase monotonically from 1 and listings come back in id order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    table: Arc<RwLock<Table>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &mut User) -> UserResult<u64> {
        let mut table = self.table.write().await;

        table.check_unique(user, None)?;

        table.last_id += 1;
        let id = table.last_id;
        user.id = Some(id);
        table.rows.insert(id, user.clone());

        tracing::debug!(user_id = id, username = %user.username, "Inserted user");
        Ok(1)
    }

    async fn select_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn select_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.username == username).cloned())
    }

    async fn select_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn select_all(&self) -> UserResult<Vec<User>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> UserResult<u64> {
        let Some(id) = user.id else {
            return Ok(0);
        };

        let mut table = self.table.write().await;
        if !table.rows.contains_key(&id) {
            return Ok(0);
        }

        table.check_unique(user, Some(id))?;
        table.rows.insert(id, user.clone());

        tracing::debug!(user_id = id, "Updated user");
        Ok(1)
    }

    async fn delete_by_id(&self, id: i64) -> UserResult<u64> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).map_or(0, |_| 1))
    }

    async fn count_by_username(&self, username: &str) -> UserResult<u64> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|u| u.username == username).count() as u64)
    }

    async fn count_by_email(&self, email: &str) -> UserResult<u64> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|u| u.email == email).count() as u64)
    }

    async fn select_by_page(&self, offset: u64, limit: u64) -> UserResult<Vec<User>> {
        let table = self.table.read().await;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(table.rows.values().skip(offset).take(limit).cloned().collect())
    }

    async fn count_total(&self) -> UserResult<u64> {
        let table = self.table.read().await;
        Ok(table.rows.len() as u64)
    }
}
