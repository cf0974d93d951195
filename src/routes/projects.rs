use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use sqlx::Row;
use std::sync::Arc;
use uuid::Uuid;

use super::{claims_user_id, internal_error};
use crate::domain::project::{DEFAULT_COLOR, Project};
use crate::security::jwt::Claims;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:id", axum::routing::delete(delete_project))
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Project>>, (StatusCode, String)> {
    let rows = sqlx::query(
        "SELECT id, name, description, color, created_at, created_by FROM projects ORDER BY name",
    )
    .fetch_all(&state.db)
    .await
    .map_err(internal_error)?;

    let projects = rows
        .into_iter()
        .map(|r| Project {
            id: r.get("id"),
            name: r.get("name"),
            description: r.get("description"),
            color: r.get("color"),
            created_at: r.get("created_at"),
            created_by: r.get("created_by"),
        })
        .collect();
    Ok(Json(projects))
}

#[derive(Deserialize)]
struct CreateProjectPayload {
    name: String,
    description: Option<String>,
    color: Option<String>,
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, String)> {
    if !super::is_admin(&claims) {
        return Err((StatusCode::FORBIDDEN, "Admin privileges required".into()));
    }
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Project name is required".into()));
    }

    let id = Uuid::new_v4();
    let created_by = claims_user_id(&claims)?;
    sqlx::query(
        "INSERT INTO projects (id, name, description, color, created_by) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(name)
    .bind(payload.description.as_deref().map(str::trim))
    .bind(payload.color.as_deref().unwrap_or(DEFAULT_COLOR))
    .bind(created_by)
    .execute(&state.db)
    .await
    .map_err(internal_error)?;

    tracing::info!(project = name, "project created");
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn delete_project(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !super::is_admin(&claims) {
        return Err((StatusCode::FORBIDDEN, "Admin privileges required".into()));
    }

    // Time entries go with the project (ON DELETE CASCADE).
    let res = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(internal_error)?;

    if res.rows_affected() == 0 {
        return Err((StatusCode::NOT_FOUND, "Project not found".into()));
    }
    tracing::info!(%id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}
