use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    routing::post,
};
use cookie::{Cookie, time::Duration as CookieDuration};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::Row;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::internal_error;
use crate::domain::user::User;
use crate::security::rate_limit;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

const REFRESH_TTL_DAYS: i64 = 30;

#[derive(Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginPayload>,
) -> Result<Response, (StatusCode, String)> {
    if !rate_limit::check(&rate_limit::client_key(&headers), 30, 60) {
        return Err((StatusCode::TOO_MANY_REQUESTS, "rate_limited".into()));
    }
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Username and password required".into()));
    }

    let row = sqlx::query(
        "SELECT id, username, password_hash, is_admin, created_at FROM users WHERE username = $1",
    )
    .bind(payload.username.trim())
    .fetch_optional(&state.db)
    .await
    .map_err(internal_error)?;

    // Same 401 whether the user is unknown or the password is wrong.
    let user = match row {
        Some(r) => User {
            id: r.get("id"),
            username: r.get("username"),
            password_hash: r.get("password_hash"),
            is_admin: r.get("is_admin"),
            created_at: r.get("created_at"),
        },
        None => return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into())),
    };

    let valid = crate::security::password::verify_password(&payload.password, &user.password_hash)
        .map_err(internal_error)?;
    if !valid {
        tracing::warn!(user = %user.username, "failed login");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let access = state
        .jwt
        .issue_access(&user.id.to_string(), user.role())
        .map_err(internal_error)?;
    let (refresh_token, refresh_hash) = generate_refresh_token();
    store_refresh_token(&state, user.id, &refresh_hash, None).await?;

    tracing::info!(user = %user.username, "login");
    Ok(token_response(access, refresh_token, &state))
}

#[derive(Deserialize)]
struct RefreshPayload {
    refresh_token: String,
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RefreshPayload>,
) -> Result<Response, (StatusCode, String)> {
    if !rate_limit::check(&rate_limit::client_key(&headers), 60, 60) {
        return Err((StatusCode::TOO_MANY_REQUESTS, "rate_limited".into()));
    }

    let hash = hash_refresh_token(&payload.refresh_token);
    let row = sqlx::query(
        "SELECT id, user_id, revoked_at, expires_at FROM refresh_tokens WHERE token_hash = $1",
    )
    .bind(&hash)
    .fetch_optional(&state.db)
    .await
    .map_err(internal_error)?;

    let row = match row {
        Some(r) => r,
        None => return Err((StatusCode::UNAUTHORIZED, "Invalid token".into())),
    };

    let revoked: Option<OffsetDateTime> = row.get("revoked_at");
    let expires_at: OffsetDateTime = row.get("expires_at");
    if revoked.is_some() || expires_at < OffsetDateTime::now_utc() {
        return Err((StatusCode::UNAUTHORIZED, "Token expired/revoked".into()));
    }

    let user_id: Uuid = row.get("user_id");
    let user = sqlx::query("SELECT is_admin FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(internal_error)?;
    let is_admin: bool = match user {
        Some(u) => u.get("is_admin"),
        None => return Err((StatusCode::UNAUTHORIZED, "Invalid token".into())),
    };

    let role = if is_admin { "admin" } else { "user" };
    let access = state
        .jwt
        .issue_access(&user_id.to_string(), role)
        .map_err(internal_error)?;

    // rotate
    let old_id: Uuid = row.get("id");
    sqlx::query("UPDATE refresh_tokens SET revoked_at = now() WHERE id = $1")
        .bind(old_id)
        .execute(&state.db)
        .await
        .map_err(internal_error)?;
    let (new_refresh, new_hash) = generate_refresh_token();
    store_refresh_token(&state, user_id, &new_hash, Some(old_id)).await?;

    Ok(token_response(access, new_refresh, &state))
}

#[derive(Deserialize)]
struct LogoutPayload {
    refresh_token: Option<String>,
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LogoutPayload>,
) -> Result<Response, (StatusCode, String)> {
    if let Some(rt) = payload.refresh_token {
        let hash = hash_refresh_token(&rt);
        sqlx::query("UPDATE refresh_tokens SET revoked_at = now() WHERE token_hash = $1")
            .bind(&hash)
            .execute(&state.db)
            .await
            .map_err(internal_error)?;
    }
    let mut res = Json(TokenResponse {
        access_token: "".into(),
        refresh_token: "".into(),
    })
    .into_response();
    clear_cookies(&mut res, &state);
    Ok(res)
}

fn generate_refresh_token() -> (String, String) {
    let raw = format!("{}-{}", Uuid::new_v4(), Uuid::new_v4());
    let hash = hash_refresh_token(&raw);
    (raw, hash)
}

fn hash_refresh_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

async fn store_refresh_token(
    state: &Arc<AppState>,
    user_id: Uuid,
    token_hash: &str,
    rotated_from: Option<Uuid>,
) -> Result<(), (StatusCode, String)> {
    let expires_at = OffsetDateTime::now_utc() + Duration::days(REFRESH_TTL_DAYS);
    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, rotated_from)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(rotated_from)
    .execute(&state.db)
    .await
    .map_err(internal_error)?;
    Ok(())
}

fn token_response(access: String, refresh: String, state: &Arc<AppState>) -> Response {
    let body = Json(TokenResponse {
        access_token: access.clone(),
        refresh_token: refresh.clone(),
    });
    let mut res = body.into_response();
    let cfg = &state.security;
    let access_ttl = CookieDuration::seconds(state.jwt.access_ttl().whole_seconds());
    append_cookie(&mut res, build_cookie(cfg, &cfg.access_cookie_name, &access, access_ttl));
    append_cookie(
        &mut res,
        build_cookie(
            cfg,
            &cfg.refresh_cookie_name,
            &refresh,
            CookieDuration::days(REFRESH_TTL_DAYS),
        ),
    );
    res
}

fn clear_cookies(res: &mut Response, state: &Arc<AppState>) {
    let cfg = &state.security;
    let zero = CookieDuration::seconds(0);
    append_cookie(&mut *res, build_cookie(cfg, &cfg.access_cookie_name, "", zero));
    append_cookie(&mut *res, build_cookie(cfg, &cfg.refresh_cookie_name, "", zero));
}

fn build_cookie(
    cfg: &crate::security::config::SecurityConfig,
    name: &str,
    value: &str,
    max_age: CookieDuration,
) -> String {
    Cookie::build((name.to_string(), value.to_string()))
        .http_only(true)
        .secure(cfg.secure_cookies)
        .same_site(cfg.same_site)
        .max_age(max_age)
        .path("/")
        .build()
        .to_string()
}

fn append_cookie(res: &mut Response, cookie: String) {
    if let Ok(value) = cookie.parse() {
        res.headers_mut().append(SET_COOKIE, value);
    }
}
