use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;
use std::sync::Arc;

use crate::state::AppState;

/// Resolves JWT claims from a bearer header or the access cookie and stores
/// them as a request extension. Rejects the request with 401 otherwise.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_from_header(req.headers())
        .or_else(|| cookie_token(req.headers(), &state.security.access_cookie_name));

    if let Some(token) = token {
        if let Ok(claims) = state.jwt.verify(&token) {
            req.extensions_mut().insert(claims);
            return Ok(next.run(req).await);
        }
    }

    Err(StatusCode::UNAUTHORIZED)
}

fn bearer_from_header(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

fn cookie_token(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        if let Ok(parsed) = Cookie::parse(part.trim().to_string()) {
            if parsed.name() == name {
                return Some(parsed.value().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn bearer_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc.def.ghi".parse().unwrap(),
        );
        assert_eq!(bearer_from_header(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn access_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "other=1; access_token=tok; trailing=2".parse().unwrap(),
        );
        assert_eq!(
            cookie_token(&headers, "access_token").as_deref(),
            Some("tok")
        );
        assert_eq!(cookie_token(&headers, "missing"), None);
    }
}
