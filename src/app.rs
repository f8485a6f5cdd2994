use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, sweets};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(sweets::router())
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8000".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PolicyConfig, state::testing};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<(&str, String)>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some((content_type, payload)) => req
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(payload))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn json_body(v: Value) -> Option<(&'static str, String)> {
        Some(("application/json", v.to_string()))
    }

    fn form_body(username: &str, password: &str) -> Option<(&'static str, String)> {
        Some((
            "application/x-www-form-urlencoded",
            format!("username={username}&password={password}"),
        ))
    }

    async fn register_and_login(app: &Router, name: &str) -> String {
        let (status, _) = call(
            app,
            Method::POST,
            "/auth/register",
            None,
            json_body(json!({ "username": name, "email": format!("{name}@x.com"), "password": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) =
            call(app, Method::POST, "/auth/login", None, form_body(name, "pw123")).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = build_app(testing::state().await);
        let (status, body) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn shop_scenario_end_to_end() {
        let app = build_app(testing::state().await);

        let (status, user) = call(
            &app,
            Method::POST,
            "/auth/register",
            None,
            json_body(json!({ "username": "alice", "email": "alice@x.com", "password": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["username"], "alice");
        assert!(user.get("password_hash").is_none());

        let (status, login) =
            call(&app, Method::POST, "/auth/login", None, form_body("alice", "pw123")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["token_type"], "bearer");
        let token = login["access_token"].as_str().unwrap().to_owned();

        let (status, list) = call(&app, Method::GET, "/sweets", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list, json!([]));

        let (status, sweet) = call(
            &app,
            Method::POST,
            "/sweets",
            Some(&token),
            json_body(json!({ "name": "Ladoo", "category": "Classic", "price": 10, "quantity": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sweet["quantity"], 5);
        let id = sweet["id"].as_i64().unwrap();
        let purchase_uri = format!("/sweets/{id}/purchase");

        for expected in (0..5).rev() {
            let (status, body) = call(&app, Method::POST, &purchase_uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["quantity"], expected);
        }

        let (status, body) = call(&app, Method::POST, &purchase_uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .to_lowercase()
            .contains("out of stock"));
    }

    #[tokio::test]
    async fn me_requires_a_valid_token() {
        let app = build_app(testing::state().await);
        let token = register_and_login(&app, "alice").await;

        let (status, me) = call(&app, Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["username"], "alice");
        assert_eq!(me["role"], "admin");

        let (status, _) = call(&app, Method::GET, "/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, Method::GET, "/auth/me", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_registration_is_bad_request() {
        let app = build_app(testing::state().await);
        register_and_login(&app, "alice").await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/register",
            None,
            json_body(json!({ "username": "alice", "email": "new@x.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Username already exists");
    }

    #[tokio::test]
    async fn bad_login_is_uniform() {
        let app = build_app(testing::state().await);
        register_and_login(&app, "alice").await;

        let wrong = call(&app, Method::POST, "/auth/login", None, form_body("alice", "nope")).await;
        let unknown = call(&app, Method::POST, "/auth/login", None, form_body("bob", "pw123")).await;
        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
        assert_eq!(wrong.1["detail"], "Incorrect username or password");
    }

    #[tokio::test]
    async fn create_without_token_is_unauthorized() {
        let app = build_app(testing::state().await);
        let (status, _) = call(
            &app,
            Method::POST,
            "/sweets",
            None,
            json_body(json!({ "name": "Gulab Jamun", "category": "Classic", "price": 15.0, "quantity": 50 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn delete_is_admin_only() {
        let app = build_app(testing::state().await);
        let admin = register_and_login(&app, "root").await;
        let user = register_and_login(&app, "alice").await;

        let (_, sweet) = call(
            &app,
            Method::POST,
            "/sweets",
            Some(&user),
            json_body(json!({ "name": "Barfi", "category": "Milk", "price": 4.5, "quantity": 2 })),
        )
        .await;
        let uri = format!("/sweets/{}", sweet["id"]);

        let (status, _) = call(&app, Method::DELETE, &uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, list) = call(&app, Method::GET, "/sweets", None, None).await;
        assert_eq!(list, json!([]));

        let (status, body) = call(&app, Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Sweet not found");
    }

    #[tokio::test]
    async fn purchase_unknown_sweet_is_not_found() {
        let app = build_app(testing::state().await);
        let (status, _) = call(&app, Method::POST, "/sweets/42/purchase", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_bodies_are_validation_errors() {
        let app = build_app(testing::state().await);

        for payload in ["{", r#"{"username":"a"}"#] {
            let (status, body) = call(
                &app,
                Method::POST,
                "/auth/register",
                None,
                Some(("application/json", payload.to_owned())),
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "payload {payload}");
            assert!(body["detail"].is_string(), "payload {payload}");
        }

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(("application/x-www-form-urlencoded", "username=alice".to_owned())),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (status, body) = call(&app, Method::POST, "/sweets/abc/purchase", None, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn admin_only_policy_forbids_regular_creators() {
        let app = build_app(
            testing::state_with(PolicyConfig {
                bootstrap_first_admin: true,
                admin_only_sweet_create: true,
            })
            .await,
        );
        let admin = register_and_login(&app, "root").await;
        let user = register_and_login(&app, "alice").await;
        let sweet = || json_body(json!({ "name": "Jalebi", "category": "Fried", "price": 3.0, "quantity": 7 }));

        let (status, body) = call(&app, Method::POST, "/sweets", Some(&user), sweet()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["detail"].is_string());

        let (status, created) = call(&app, Method::POST, "/sweets", Some(&admin), sweet()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "Jalebi");
    }
}
