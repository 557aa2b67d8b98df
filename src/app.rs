use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, profile};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1",
              Router::new()
                  .merge(auth::router())
                  .merge(profile::router())
                  .route("/health", get(health))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
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

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
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
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(test_state());
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn signup_login_and_email_change_flow() {
        let state = test_state();
        let app = build_app(state.clone());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "a@b.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"].get("password_hash").is_none());
        let id = body["data"]["user_id"].as_i64().unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "a@b.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/profile/{id}/email"),
            Some(&token),
            Some(json!({ "email": "A@B.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Email updated");

        let user = state.store.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn duplicate_signup_is_conflict() {
        let app = build_app(test_state());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "Test@Example.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email already registered");
    }

    #[tokio::test]
    async fn signup_missing_fields_is_bad_request() {
        let app = build_app(test_state());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "x@y.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email and password required");
    }

    #[tokio::test]
    async fn profile_routes_require_a_valid_token() {
        let state = test_state();
        let app = build_app(state.clone());

        let (status, _) = call(&app, Method::PUT, "/api/v1/profile/1", None, Some(json!({ "name": "x" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::PUT, "/api/v1/profile/1", Some("garbage"), Some(json!({ "name": "x" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let unknown = state.jwt.sign(404).unwrap();
        let (status, body) = call(&app, Method::PUT, "/api/v1/profile/404", Some(&unknown), Some(json!({ "name": "x" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid user");

        let demo = state.jwt.sign(1).unwrap();
        let (status, body) = call(&app, Method::PUT, "/api/v1/profile/1", Some(&demo), Some(json!({ "name": "Renamed" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Profile updated");
        assert_eq!(state.store.find_by_id(1).await.unwrap().unwrap().name, "Renamed");
    }

    #[tokio::test]
    async fn password_change_takes_effect_on_login() {
        let state = test_state();
        let app = build_app(state.clone());
        let demo = state.jwt.sign(1).unwrap();

        // demo account starts without a password
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "test@example.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/v1/profile/1/password",
            Some(&demo),
            Some(json!({ "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password updated");

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "TEST@example.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cumulative_gpa"], 3.5);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = build_app(test_state());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
