use tracing::{info, warn};

use super::{dto::CreateSweetRequest, repo, repo_types::Sweet};
use crate::{
    auth::repo_types::User,
    error::{AppError, AppResult},
    state::AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Sweet not found".into())
}

fn forbidden() -> AppError {
    AppError::Forbidden("Not enough permissions. Admin role required.".into())
}

pub async fn list(st: &AppState) -> AppResult<Vec<Sweet>> {
    Ok(repo::list_all(&st.db).await?)
}

/// `actor` is already authenticated; the admin-only policy is applied here.
pub async fn create(st: &AppState, actor: &User, req: CreateSweetRequest) -> AppResult<Sweet> {
    if st.config.policy.admin_only_sweet_create && !actor.is_admin() {
        warn!(user_id = actor.id, "sweet creation restricted to admins");
        return Err(forbidden());
    }
    req.validate()?;

    let sweet = repo::insert(&st.db, &req).await?;
    info!(sweet_id = sweet.id, user_id = actor.id, name = %sweet.name, "sweet created");
    Ok(sweet)
}

pub async fn purchase(st: &AppState, id: i64) -> AppResult<Sweet> {
    if let Some(sweet) = repo::decrement_stock(&st.db, id).await? {
        info!(sweet_id = id, remaining = sweet.quantity, "sweet purchased");
        return Ok(sweet);
    }
    match repo::find(&st.db, id).await? {
        Some(_) => {
            warn!(sweet_id = id, "purchase of sold-out sweet");
            Err(AppError::OutOfStock("Sweet is out of stock".into()))
        }
        None => Err(not_found()),
    }
}

pub async fn delete(st: &AppState, actor: &User, id: i64) -> AppResult<()> {
    if !actor.is_admin() {
        warn!(user_id = actor.id, sweet_id = id, "non-admin delete attempt");
        return Err(forbidden());
    }
    if !repo::delete(&st.db, id).await? {
        return Err(not_found());
    }
    info!(sweet_id = id, user_id = actor.id, "sweet deleted");
    Ok(())
}
