use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSweetRequest {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
}

impl CreateSweetRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name must not be empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::Validation("Category must not be empty".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::Validation("Price must be a non-negative number".into()));
        }
        if self.quantity < 0 {
            return Err(AppError::Validation("Quantity must not be negative".into()));
        }
        Ok(())
    }
}
