use chrono::Utc;
use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserPage};
use crate::repository::UserStore;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// User directory: validation and uniqueness rules over a [`UserStore`].
///
/// Writes pre-check username before email so callers always see the
/// username conflict first. The store enforces the same rules, which
/// closes the window between a pre-check and the write.
#[derive(Clone)]
pub struct UserDirectory<S: UserStore> {
    store: Arc<S>,
}

impl<S: UserStore> UserDirectory<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a user; the store assigns the id.
    pub async fn create_user(&self, mut candidate: User) -> UserResult<User> {
        tracing::debug!("Creating user with username: {}", candidate.username);

        if candidate.id.is_some() {
            tracing::warn!("Rejected create with preset id {:?}", candidate.id);
            return Err(UserError::Validation(
                "id is assigned by the store and must not be set".to_string(),
            ));
        }
        validate_identity(&candidate)?;

        if self.exists_by_username(&candidate.username).await? {
            tracing::warn!("Username already exists: {}", candidate.username);
            return Err(UserError::DuplicateUsername(candidate.username));
        }
        if self.store.count_by_email(&candidate.email).await? > 0 {
            tracing::warn!("Email already exists: {}", candidate.email);
            return Err(UserError::DuplicateEmail(candidate.email));
        }

        let now = Utc::now();
        candidate.create_time = Some(now);
        candidate.update_time = Some(now);

        let rows = self
            .store
            .insert(&mut candidate)
            .await
            .inspect_err(|e| log_write_failure("create", &candidate.username, e))?;

        if rows == 0 || candidate.id.is_none() {
            tracing::error!("Failed to create user: {}", candidate.username);
            return Err(UserError::Persistence("user was not created".to_string()));
        }

        tracing::info!(user_id = ?candidate.id, "User created successfully: {}", candidate.username);
        Ok(candidate)
    }

    pub async fn find_by_id(&self, id: Option<i64>) -> UserResult<Option<User>> {
        tracing::debug!("Finding user by ID: {:?}", id);

        let Some(id) = id else {
            tracing::warn!("User ID is missing");
            return Ok(None);
        };

        let user = self
            .store
            .select_by_id(id)
            .await
            .inspect_err(|e| tracing::error!("Error finding user by ID {}: {}", id, e))?;

        if user.is_none() {
            tracing::debug!("No user found with ID: {}", id);
        }
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        tracing::debug!("Finding user by username: {}", username);

        if username.trim().is_empty() {
            tracing::warn!("Username is blank");
            return Ok(None);
        }

        self.store
            .select_by_username(username)
            .await
            .inspect_err(|e| tracing::error!("Error finding user by username {}: {}", username, e))
    }

    /// Every user, in store order.
    pub async fn find_all_users(&self) -> UserResult<Vec<User>> {
        tracing::debug!("Finding all users");

        let users = self
            .store
            .select_all()
            .await
            .inspect_err(|e| tracing::error!("Error finding all users: {}", e))?;

        tracing::info!("Found {} users", users.len());
        Ok(users)
    }

    /// One page of users. `page` is 1-based (0 reads as 1) and `size` is
    /// clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn find_users_page(&self, page: u64, size: u64) -> UserResult<UserPage> {
        let page = page.max(1);
        let size = size.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(size);
        tracing::debug!(page, size, offset, "Finding users page");

        let items = self
            .store
            .select_by_page(offset, size)
            .await
            .inspect_err(|e| tracing::error!("Error finding users page {}: {}", page, e))?;
        let total = self.store.count_total().await?;

        Ok(UserPage {
            items,
            total,
            page,
            size,
        })
    }

    /// Replace a user's fields. `create_time` is kept from the stored record.
    pub async fn update_user(&self, mut candidate: User) -> UserResult<User> {
        tracing::debug!("Updating user with ID: {:?}", candidate.id);

        let Some(id) = candidate.id else {
            tracing::warn!("Rejected update without an id");
            return Err(UserError::Validation("user id is required".to_string()));
        };
        validate_identity(&candidate)?;

        let Some(existing) = self.find_by_id(Some(id)).await? else {
            tracing::warn!("User not found with ID: {}", id);
            return Err(UserError::NotFound(id));
        };

        if existing.username != candidate.username
            && self.exists_by_username(&candidate.username).await?
        {
            tracing::warn!("Username already exists: {}", candidate.username);
            return Err(UserError::DuplicateUsername(candidate.username));
        }
        if existing.email != candidate.email
            && self.store.count_by_email(&candidate.email).await? > 0
        {
            tracing::warn!("Email already exists: {}", candidate.email);
            return Err(UserError::DuplicateEmail(candidate.email));
        }

        candidate.create_time = existing.create_time;
        candidate.update_time = Some(Utc::now());

        let rows = self
            .store
            .update(&candidate)
            .await
            .inspect_err(|e| log_write_failure("update", &candidate.username, e))?;

        if rows == 0 {
            tracing::error!("Failed to update user: {}", candidate.username);
            return Err(UserError::Persistence("user was not updated".to_string()));
        }

        tracing::info!(user_id = id, "User updated successfully: {}", candidate.username);
        Ok(candidate)
    }

    /// `false` when there is no id or nothing was deleted.
    pub async fn delete_user(&self, id: Option<i64>) -> UserResult<bool> {
        tracing::debug!("Deleting user with ID: {:?}", id);

        let Some(id) = id else {
            tracing::warn!("User ID is missing");
            return Ok(false);
        };

        let rows = self
            .store
            .delete_by_id(id)
            .await
            .inspect_err(|e| tracing::error!("Error deleting user {}: {}", id, e))?;

        if rows > 0 {
            tracing::info!("User deleted successfully: {}", id);
            Ok(true)
        } else {
            tracing::warn!("No user found to delete with ID: {}", id);
            Ok(false)
        }
    }

    /// Blank usernames never exist and are not looked up.
    pub async fn exists_by_username(&self, username: &str) -> UserResult<bool> {
        if username.trim().is_empty() {
            return Ok(false);
        }

        let count = self
            .store
            .count_by_username(username)
            .await
            .inspect_err(|e| tracing::error!("Error checking username {}: {}", username, e))?;

        let exists = count > 0;
        tracing::debug!("Username '{}' exists: {}", username, exists);
        Ok(exists)
    }
}

fn validate_identity(user: &User) -> UserResult<()> {
    if user.username.trim().is_empty() {
        tracing::warn!("Rejected user with blank username");
        return Err(UserError::Validation("username must not be blank".to_string()));
    }
    if user.email.trim().is_empty() {
        tracing::warn!("Rejected user with blank email");
        return Err(UserError::Validation("email must not be blank".to_string()));
    }
    Ok(())
}

fn log_write_failure(action: &str, username: &str, err: &UserError) {
    if err.is_conflict() {
        tracing::warn!("Store rejected {} of {}: {}", action, username, err);
    } else {
        tracing::error!("Error during {} of {}: {}", action, username, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserStore;
    use chrono::Duration;
    use mockall::predicate::*;

    fn candidate() -> User {
        User::new("alice", "alice@example.com", Some("555-0100".into()))
    }

    fn stored(id: i64) -> User {
        let created = Utc::now() - Duration::days(3);
        User {
            id: Some(id),
            create_time: Some(created),
            update_time: Some(created),
            ..candidate()
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut store = MockUserStore::new();
        store
            .expect_count_by_username()
            .with(eq("alice"))
            .times(1)
            .returning(|_| Ok(0));
        store
            .expect_count_by_email()
            .with(eq("alice@example.com"))
            .times(1)
            .returning(|_| Ok(0));
        store.expect_insert().times(1).returning(|user| {
            assert!(user.create_time.is_some());
            assert_eq!(user.create_time, user.update_time);
            user.id = Some(1);
            Ok(1)
        });

        let directory = UserDirectory::new(store);
        let created = directory.create_user(candidate()).await.unwrap();

        assert_eq!(created.id, Some(1));
        assert_eq!(created.username, "alice");
        assert!(created.create_time.is_some());
    }

    #[tokio::test]
    async fn test_create_user_duplicate_username_skips_email_and_insert() {
        let mut store = MockUserStore::new();
        store.expect_count_by_username().returning(|_| Ok(1));
        store.expect_count_by_email().never();
        store.expect_insert().never();

        let directory = UserDirectory::new(store);
        let err = directory.create_user(candidate()).await.unwrap_err();

        assert!(matches!(err, UserError::DuplicateUsername(name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_never_inserts() {
        let mut store = MockUserStore::new();
        store.expect_count_by_username().returning(|_| Ok(0));
        store.expect_count_by_email().returning(|_| Ok(1));
        store.expect_insert().never();

        let directory = UserDirectory::new(store);
        let err = directory.create_user(candidate()).await.unwrap_err();

        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_create_user_rejects_blank_and_preset_id() {
        let mut store = MockUserStore::new();
        store.expect_count_by_username().never();
        store.expect_insert().never();
        let directory = UserDirectory::new(store);

        let blank = User::new("  ", "alice@example.com", None);
        assert!(matches!(
            directory.create_user(blank).await,
            Err(UserError::Validation(_))
        ));

        let no_email = User::new("alice", "", None);
        assert!(matches!(
            directory.create_user(no_email).await,
            Err(UserError::Validation(_))
        ));

        assert!(matches!(
            directory.create_user(candidate().with_id(5)).await,
            Err(UserError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_user_zero_rows_is_persistence_error() {
        let mut store = MockUserStore::new();
        store.expect_count_by_username().returning(|_| Ok(0));
        store.expect_count_by_email().returning(|_| Ok(0));
        store.expect_insert().returning(|_| Ok(0));

        let directory = UserDirectory::new(store);
        let err = directory.create_user(candidate()).await.unwrap_err();

        assert!(matches!(err, UserError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_create_user_store_conflict_passes_through() {
        let mut store = MockUserStore::new();
        store.expect_count_by_username().returning(|_| Ok(0));
        store.expect_count_by_email().returning(|_| Ok(0));
        store
            .expect_insert()
            .returning(|user| Err(UserError::DuplicateUsername(user.username.clone())));

        let directory = UserDirectory::new(store);
        let err = directory.create_user(candidate()).await.unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_find_by_id_missing_id_skips_store() {
        let mut store = MockUserStore::new();
        store.expect_select_by_id().never();

        let directory = UserDirectory::new(store);
        assert_eq!(directory.find_by_id(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_id_not_found_is_empty() {
        let mut store = MockUserStore::new();
        store
            .expect_select_by_id()
            .with(eq(42))
            .returning(|_| Ok(None));

        let directory = UserDirectory::new(store);
        assert_eq!(directory.find_by_id(Some(42)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_username_blank_skips_store() {
        let mut store = MockUserStore::new();
        store.expect_select_by_username().never();

        let directory = UserDirectory::new(store);
        assert_eq!(directory.find_by_username("   ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_all_users_returns_store_order() {
        let mut store = MockUserStore::new();
        store
            .expect_select_all()
            .returning(|| Ok(vec![stored(2), stored(1)]));

        let directory = UserDirectory::new(store);
        let ids: Vec<_> = directory
            .find_all_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();

        assert_eq!(ids, vec![Some(2), Some(1)]);
    }

    #[tokio::test]
    async fn test_find_users_page_clamps_arguments() {
        let mut store = MockUserStore::new();
        store
            .expect_select_by_page()
            .with(eq(0), eq(MAX_PAGE_SIZE))
            .returning(|_, _| Ok(vec![]));
        store
            .expect_select_by_page()
            .with(eq(20), eq(10))
            .returning(|_, _| Ok(vec![stored(21)]));
        store.expect_count_total().times(2).returning(|| Ok(21));

        let directory = UserDirectory::new(store);

        let first = directory.find_users_page(0, 500).await.unwrap();
        assert_eq!((first.page, first.size), (1, MAX_PAGE_SIZE));

        let third = directory.find_users_page(3, 10).await.unwrap();
        assert_eq!(third.items.len(), 1);
        assert_eq!(third.total, 21);
    }

    #[tokio::test]
    async fn test_update_user_requires_id() {
        let store = MockUserStore::new();
        let directory = UserDirectory::new(store);

        let err = directory.update_user(candidate()).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_user_blank_identity_is_rejected() {
        let mut store = MockUserStore::new();
        store.expect_select_by_id().never();
        store.expect_update().never();
        let directory = UserDirectory::new(store);

        let blank_username = User {
            username: "   ".into(),
            ..candidate().with_id(1)
        };
        assert!(matches!(
            directory.update_user(blank_username).await,
            Err(UserError::Validation(_))
        ));

        let blank_email = User {
            email: String::new(),
            ..candidate().with_id(1)
        };
        assert!(matches!(
            directory.update_user(blank_email).await,
            Err(UserError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let mut store = MockUserStore::new();
        store.expect_select_by_id().returning(|_| Ok(None));
        store.expect_update().never();

        let directory = UserDirectory::new(store);
        let err = directory.update_user(candidate().with_id(9)).await.unwrap_err();

        assert!(matches!(err, UserError::NotFound(9)));
    }

    #[tokio::test]
    async fn test_update_user_unchanged_fields_skip_uniqueness_checks() {
        let existing = stored(1);
        let created = existing.create_time;

        let mut store = MockUserStore::new();
        store
            .expect_select_by_id()
            .with(eq(1))
            .returning(move |_| Ok(Some(existing.clone())));
        store.expect_count_by_username().never();
        store.expect_count_by_email().never();
        store.expect_update().times(1).returning(|_| Ok(1));

        let directory = UserDirectory::new(store);
        let mut change = candidate().with_id(1);
        change.phone = Some("555-0199".into());
        change.create_time = Some(Utc::now());

        let updated = directory.update_user(change).await.unwrap();
        assert_eq!(updated.create_time, created);
        assert!(updated.update_time > created);
        assert_eq!(updated.phone.as_deref(), Some("555-0199"));
    }

    #[tokio::test]
    async fn test_update_user_changed_username_conflict() {
        let mut store = MockUserStore::new();
        store
            .expect_select_by_id()
            .returning(|_| Ok(Some(stored(1))));
        store
            .expect_count_by_username()
            .with(eq("bob"))
            .returning(|_| Ok(1));
        store.expect_update().never();

        let directory = UserDirectory::new(store);
        let mut change = candidate().with_id(1);
        change.username = "bob".into();

        let err = directory.update_user(change).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateUsername(_)));
    }

    #[tokio::test]
    async fn test_update_user_changed_email_conflict() {
        let mut store = MockUserStore::new();
        store
            .expect_select_by_id()
            .returning(|_| Ok(Some(stored(1))));
        store.expect_count_by_username().never();
        store
            .expect_count_by_email()
            .with(eq("bob@example.com"))
            .returning(|_| Ok(1));
        store.expect_update().never();

        let directory = UserDirectory::new(store);
        let mut change = candidate().with_id(1);
        change.email = "bob@example.com".into();

        let err = directory.update_user(change).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_update_user_zero_rows_is_persistence_error() {
        let mut store = MockUserStore::new();
        store
            .expect_select_by_id()
            .returning(|_| Ok(Some(stored(1))));
        store.expect_update().returning(|_| Ok(0));

        let directory = UserDirectory::new(store);
        let err = directory.update_user(candidate().with_id(1)).await.unwrap_err();

        assert!(matches!(err, UserError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let mut store = MockUserStore::new();
        store
            .expect_delete_by_id()
            .with(eq(1))
            .returning(|_| Ok(1));
        store
            .expect_delete_by_id()
            .with(eq(2))
            .returning(|_| Ok(0));

        let directory = UserDirectory::new(store);
        assert!(directory.delete_user(Some(1)).await.unwrap());
        assert!(!directory.delete_user(Some(2)).await.unwrap());
        assert!(!directory.delete_user(None).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_user_store_failure_surfaces() {
        let mut store = MockUserStore::new();
        store
            .expect_delete_by_id()
            .returning(|_| Err(UserError::Persistence("connection lost".into())));

        let directory = UserDirectory::new(store);
        assert!(matches!(
            directory.delete_user(Some(1)).await,
            Err(UserError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_exists_by_username() {
        let mut store = MockUserStore::new();
        store
            .expect_count_by_username()
            .with(eq("alice"))
            .returning(|_| Ok(1));
        store
            .expect_count_by_username()
            .with(eq("nobody"))
            .returning(|_| Ok(0));

        let directory = UserDirectory::new(store);
        assert!(directory.exists_by_username("alice").await.unwrap());
        assert!(!directory.exists_by_username("nobody").await.unwrap());
        assert!(!directory.exists_by_username("").await.unwrap());
        assert!(!directory.exists_by_username("  ").await.unwrap());
    }
}
