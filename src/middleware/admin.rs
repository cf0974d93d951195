use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::security::jwt::Claims;

/// Runs inside `require_auth`; claims are already in the extensions.
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    match req.extensions().get::<Claims>() {
        Some(c) if c.role == "admin" => Ok(next.run(req).await),
        _ => Err(StatusCode::FORBIDDEN),
    }
}
