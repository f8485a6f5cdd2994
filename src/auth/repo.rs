use crate::auth::repo_types::User;
use sqlx::SqlitePool;

impl User {
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn email_taken(db: &SqlitePool, email: &str) -> sqlx::Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    /// Inserts a user. With `bootstrap_admin` set, the row becomes an admin
    /// iff the table was empty; the check and insert are one statement.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
        bootstrap_admin: bool,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            SELECT ?, ?, ?,
                   CASE WHEN ? AND NOT EXISTS (SELECT 1 FROM users) THEN 'admin' ELSE 'user' END
            RETURNING id, username, email, password_hash, role
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(bootstrap_admin)
        .fetch_one(db)
        .await
    }
}
