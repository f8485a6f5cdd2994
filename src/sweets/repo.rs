use sqlx::SqlitePool;

use crate::sweets::{dto::CreateSweetRequest, repo_types::Sweet};

pub async fn list_all(db: &SqlitePool) -> sqlx::Result<Vec<Sweet>> {
    sqlx::query_as::<_, Sweet>(
        r#"
        SELECT id, name, category, price, quantity
        FROM sweets
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn find(db: &SqlitePool, id: i64) -> sqlx::Result<Option<Sweet>> {
    sqlx::query_as::<_, Sweet>(
        "SELECT id, name, category, price, quantity FROM sweets WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert(db: &SqlitePool, new: &CreateSweetRequest) -> sqlx::Result<Sweet> {
    sqlx::query_as::<_, Sweet>(
        r#"
        INSERT INTO sweets (name, category, price, quantity)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, category, price, quantity
        "#,
    )
    .bind(&new.name)
    .bind(&new.category)
    .bind(new.price)
    .bind(new.quantity)
    .fetch_one(db)
    .await
}

/// Takes one unit of stock. `None` when the sweet is missing or sold out;
/// the condition and the decrement run as one statement.
pub async fn decrement_stock(db: &SqlitePool, id: i64) -> sqlx::Result<Option<Sweet>> {
    sqlx::query_as::<_, Sweet>(
        r#"
        UPDATE sweets
           SET quantity = quantity - 1
         WHERE id = ? AND quantity > 0
        RETURNING id, name, category, price, quantity
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Returns whether a row was removed.
pub async fn delete(db: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM sweets WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
