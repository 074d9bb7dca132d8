use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement};

use crate::error::{UserError, UserResult};
use crate::models::User;
use crate::repository::UserStore;

const COLUMNS: &str = "id, username, email, phone, create_time, update_time";

/// PostgreSQL implementation of UserStore using SeaORM
///
/// Uniqueness is backed by the unique keys on `users.username` and
/// `users.email`; violations come back as the matching duplicate error.
#[derive(Clone)]
pub struct PgUserStore {
    db: DatabaseConnection,
}

impl PgUserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn select_one(&self, sql: &str, value: sea_orm::Value) -> UserResult<Option<User>> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [value]);
        let row = UserRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(row.map(Into::into))
    }

    async fn count(&self, sql: &str, values: Vec<sea_orm::Value>) -> UserResult<u64> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, values);
        let row = CountRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(row.map_or(0, |r| r.count.max(0) as u64))
    }
}

#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    phone: Option<String>,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: Some(row.id),
            username: row.username,
            email: row.email,
            phone: row.phone,
            create_time: Some(row.create_time),
            update_time: Some(row.update_time),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct IdRow {
    id: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

/// Map unique-key violations to conflicts, everything else to persistence errors
fn write_error(err: DbErr, user: &User) -> UserError {
    let err_str = err.to_string();
    if err_str.contains("duplicate key") || err_str.contains("unique constraint") {
        if err_str.contains("username") {
            UserError::DuplicateUsername(user.username.clone())
        } else {
            UserError::DuplicateEmail(user.email.clone())
        }
    } else {
        UserError::from(err)
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &mut User) -> UserResult<u64> {
        let sql = r#"
            INSERT INTO users (username, email, phone, create_time, update_time)
            VALUES ($1, $2, $3, COALESCE($4, NOW()), COALESCE($5, NOW()))
            RETURNING id
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.username.clone().into(),
                user.email.clone().into(),
                user.phone.clone().into(),
                user.create_time.into(),
                user.update_time.into(),
            ],
        );

        let row = IdRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| write_error(e, user))?;

        match row {
            Some(IdRow { id }) => {
                user.id = Some(id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn select_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        self.select_one(&sql, id.into()).await
    }

    async fn select_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        self.select_one(&sql, username.into()).await
    }

    async fn select_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        self.select_one(&sql, email.into()).await
    }

    async fn select_all(&self) -> UserResult<Vec<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users ORDER BY id");
        let stmt = Statement::from_string(DbBackend::Postgres, sql);
        let rows = UserRow::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, user: &User) -> UserResult<u64> {
        let Some(id) = user.id else {
            return Ok(0);
        };

        let sql = r#"
            UPDATE users
            SET username = $1, email = $2, phone = $3, update_time = COALESCE($4, NOW())
            WHERE id = $5
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.username.clone().into(),
                user.email.clone().into(),
                user.phone.clone().into(),
                user.update_time.into(),
                id.into(),
            ],
        );

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| write_error(e, user))?;

        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: i64) -> UserResult<u64> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM users WHERE id = $1",
            [id.into()],
        );
        let result = self.db.execute_raw(stmt).await?;
        Ok(result.rows_affected())
    }

    async fn count_by_username(&self, username: &str) -> UserResult<u64> {
        self.count(
            "SELECT COUNT(*) AS count FROM users WHERE username = $1",
            vec![username.into()],
        )
        .await
    }

    async fn count_by_email(&self, email: &str) -> UserResult<u64> {
        self.count(
            "SELECT COUNT(*) AS count FROM users WHERE email = $1",
            vec![email.into()],
        )
        .await
    }

    async fn select_by_page(&self, offset: u64, limit: u64) -> UserResult<Vec<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2");
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [to_i64(limit).into(), to_i64(offset).into()],
        );
        let rows = UserRow::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_total(&self) -> UserResult<u64> {
        self.count("SELECT COUNT(*) AS count FROM users", Vec::new())
            .await
    }
}
