use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use uuid::Uuid;

use crate::middleware;
use crate::security::jwt::Claims;
use crate::state::AppState;

mod admin;
mod auth;
mod entries;
mod projects;
mod stats;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = admin::router().route_layer(from_fn(middleware::admin::require_admin));

    let protected = Router::new()
        .merge(projects::router())
        .merge(entries::router())
        .merge(stats::router())
        .merge(admin_routes)
        .route("/me", get(me))
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    Router::new().merge(auth::router()).merge(protected)
}

async fn me(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}

pub(crate) fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// User id out of the JWT subject.
pub(crate) fn claims_user_id(claims: &Claims) -> Result<Uuid, (StatusCode, String)> {
    claims
        .sub
        .parse()
        .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid token subject".into()))
}

pub(crate) fn is_admin(claims: &Claims) -> bool {
    claims.role == "admin"
}
