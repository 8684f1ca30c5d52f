use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        jwt::TokenKeys,
        repo_types::NewUser,
        services::{hash_password, verify_password},
    },
    error::{AppError, INVALID_TOKEN},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(payload) = body?;
    let reg = payload.validate().map_err(|e| {
        warn!(error = %e, "invalid registration");
        e
    })?;

    // Ensure email is not taken
    if state.users.find_by_email(&reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&state, reg.password).await?;

    let user = state
        .users
        .create(NewUser {
            first_name: reg.first_name,
            last_name: reg.last_name,
            email: reg.email,
            password_hash,
        })
        .await?;

    let token = TokenKeys::from_ref(&state).issue(&user.id.to_string(), &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = body?;
    let (email, password) = payload.validate()?;

    // Unknown accounts still pay for one derivation against the decoy hash.
    let user = state.users.find_by_email(&email).await?;
    let stored = match &user {
        Some(u) => u.password_hash.clone(),
        None => state.credentials.decoy_hash().to_string(),
    };
    let password_ok = verify_password(&state, password, stored).await?;

    let Some(user) = user else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::invalid_credentials());
    };
    if !password_ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::invalid_credentials());
    }

    let token = TokenKeys::from_ref(&state).issue(&user.id.to_string(), &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, subject))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_email(&subject.email)
        .await?
        .filter(|u| u.id.to_string() == subject.subject)
        .ok_or_else(|| {
            warn!(user_id = %subject.subject, "token subject no longer exists");
            AppError::Authentication(INVALID_TOKEN)
        })?;

    Ok(Json(PublicUser::from(&user)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, Response},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        app::build_app, auth::repo::MemoryUserRepo, config::AppConfig,
        locations::repo::MemoryLocationRepo,
    };

    fn test_state() -> (AppState, Arc<MemoryUserRepo>) {
        let users = Arc::new(MemoryUserRepo::default());
        let state = AppState::from_parts(
            Arc::new(AppConfig::for_tests()),
            users.clone(),
            Arc::new(MemoryLocationRepo::default()),
        )
        .unwrap();
        (state, users)
    }

    async fn post_json(state: &AppState, uri: &str, body: Value) -> Response<Body> {
        build_app(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(resp: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sample_user() -> Value {
        json!({"firstName": "A", "lastName": "B", "email": "a@b.com", "password": "secret1"})
    }

    #[tokio::test]
    async fn register_duplicate_and_wrong_password_scenario() {
        let (state, users) = test_state();

        let resp = post_json(&state, "/register", sample_user()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["user"]["email"], "a@b.com");
        assert_eq!(body["user"]["firstName"], "A");
        assert!(body["user"].get("passwordHash").is_none());
        let token = body["token"].as_str().unwrap();
        assert_eq!(token.split('.').count(), 3);

        let resp = post_json(&state, "/register", sample_user()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(resp).await["error"], "conflict");
        assert_eq!(users.len(), 1);

        let resp = post_json(
            &state,
            "/login",
            json!({"email": "a@b.com", "password": "wrong"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "authentication_error");
    }

    #[tokio::test]
    async fn issued_token_identifies_the_registered_user() {
        let (state, _) = test_state();
        let body = body_json(post_json(&state, "/register", sample_user()).await).await;

        let subject = TokenKeys::from_ref(&state)
            .verify(body["token"].as_str().unwrap())
            .unwrap();
        assert_eq!(subject.subject, body["user"]["id"].as_str().unwrap());
        assert_eq!(subject.email, "a@b.com");
    }

    #[tokio::test]
    async fn login_succeeds_with_normalized_email() {
        let (state, _) = test_state();
        post_json(&state, "/register", sample_user()).await;

        let resp = post_json(
            &state,
            "/login",
            json!({"email": "  A@B.COM ", "password": "secret1"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["user"]["email"], "a@b.com");
        assert!(TokenKeys::from_ref(&state)
            .verify(body["token"].as_str().unwrap())
            .is_ok());
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let (state, _) = test_state();
        post_json(&state, "/register", sample_user()).await;

        let unknown = post_json(
            &state,
            "/login",
            json!({"email": "nobody@b.com", "password": "secret1"}),
        )
        .await;
        let wrong = post_json(
            &state,
            "/login",
            json!({"email": "a@b.com", "password": "secret2"}),
        )
        .await;

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(unknown).await, body_json(wrong).await);
    }

    #[tokio::test]
    async fn register_validation_failures_are_client_errors() {
        let (state, users) = test_state();
        for body in [
            json!({"firstName": "A", "email": "a@b.com", "password": "secret1"}),
            json!({"firstName": "A", "lastName": "B", "email": "a.b.com", "password": "secret1"}),
            json!({"firstName": "A", "lastName": "B", "email": "a@b.com", "password": "123"}),
        ] {
            let resp = post_json(&state, "/register", body).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(resp).await["error"], "validation_error");
        }
        assert_eq!(users.len(), 0);
    }

    #[tokio::test]
    async fn register_accepts_alias_name_fields() {
        let (state, _) = test_state();
        let resp = post_json(
            &state,
            "/register",
            json!({"ism": "Ali", "familya": "Valiyev", "email": "Ali@Example.com", "password": "secret1"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["user"]["firstName"], "Ali");
        assert_eq!(body["user"]["lastName"], "Valiyev");
        assert_eq!(body["user"]["email"], "ali@example.com");
    }

    #[tokio::test]
    async fn login_without_password_is_a_client_error() {
        let (state, _) = test_state();
        let resp = post_json(&state, "/login", json!({"email": "a@b.com"})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    async fn post_raw(
        state: &AppState,
        uri: &str,
        content_type: Option<&str>,
        body: &'static str,
    ) -> Response<Body> {
        let mut req = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            req = req.header("content-type", ct);
        }
        build_app(state.clone())
            .oneshot(req.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn unreadable_bodies_get_the_json_error_shape() {
        let (state, users) = test_state();
        let cases = [
            ("/register", Some("application/json"), "{not json"),
            ("/login", Some("application/json"), "{not json"),
            ("/login", None, r#"{"email":"a@b.com","password":"secret1"}"#),
            ("/login", Some("text/plain"), r#"{"email":"a@b.com","password":"secret1"}"#),
            ("/register", Some("application/json"), "[1, 2]"),
            ("/register", Some("application/json"), ""),
        ];
        for (uri, content_type, body) in cases {
            let resp = post_raw(&state, uri, content_type, body).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri} {content_type:?} {body}");
            let json = body_json(resp).await;
            assert_eq!(json["error"], "validation_error");
            assert!(json["message"].is_string());
        }
        assert_eq!(users.len(), 0);
    }

    #[tokio::test]
    async fn scalar_fields_are_read_as_strings() {
        let (state, _) = test_state();
        let resp = post_json(
            &state,
            "/register",
            json!({"firstName": "A", "lastName": 7, "email": "a@b.com", "password": 123456}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(body_json(resp).await["user"]["lastName"], "7");

        let resp = post_json(
            &state,
            "/login",
            json!({"email": "a@b.com", "password": "123456"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = post_json(
            &state,
            "/login",
            json!({"email": "a@b.com", "password": {"nested": true}}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    async fn get_me_with(state: &AppState, auth: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().uri("/me");
        if let Some(value) = auth {
            req = req.header("authorization", value);
        }
        build_app(state.clone())
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn me_returns_the_token_owner() {
        let (state, _) = test_state();
        let body = body_json(post_json(&state, "/register", sample_user()).await).await;
        let token = body["token"].as_str().unwrap();

        let resp = get_me_with(&state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let me = body_json(resp).await;
        assert_eq!(me["id"], body["user"]["id"]);
        assert_eq!(me["email"], "a@b.com");
    }

    #[tokio::test]
    async fn me_rejects_missing_tampered_and_foreign_tokens_uniformly() {
        let (state, _) = test_state();
        let body = body_json(post_json(&state, "/register", sample_user()).await).await;
        let token = body["token"].as_str().unwrap();

        let tampered = format!("Bearer {}x", token);
        let foreign = TokenKeys::new(&crate::config::AuthConfig {
            secret: "someone-else".into(),
            token_ttl_secs: 60,
        })
        .issue(body["user"]["id"].as_str().unwrap(), "a@b.com")
        .unwrap();
        let foreign = format!("Bearer {foreign}");

        let missing = body_json(get_me_with(&state, None).await).await;
        for auth in [tampered.as_str(), foreign.as_str(), "Basic abc", "Bearer a.b.c"] {
            let resp = get_me_with(&state, Some(auth)).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{auth}");
            assert_eq!(body_json(resp).await, missing);
        }
        assert_eq!(missing["error"], "authentication_error");
    }
}
