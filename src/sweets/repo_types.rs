use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog item with its available stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sweet {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
}
