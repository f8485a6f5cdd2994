mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod state;
mod sweets;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "sweetshop=debug,axum=info,tower_http=info,sqlx=warn".to_string()
    });
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    db::migrate(&app_state.db).await?;
    tracing::info!(
        bootstrap_first_admin = app_state.config.policy.bootstrap_first_admin,
        admin_only_sweet_create = app_state.config.policy.admin_only_sweet_create,
        "policies loaded"
    );

    app::serve(app::build_app(app_state)).await
}
