//! User management, reachable only through the admin middleware.

use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{claims_user_id, internal_error};
use crate::domain::time_entry::TimeEntry;
use crate::domain::user::User;
use crate::security::jwt::Claims;
use crate::security::password;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/:id",
            axum::routing::put(update_user).delete(delete_user),
        )
        .route("/admin/entries", get(list_entries))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    let rows = sqlx::query(
        "SELECT id, username, password_hash, is_admin, created_at FROM users ORDER BY username",
    )
    .fetch_all(&state.db)
    .await
    .map_err(internal_error)?;

    // password_hash never serializes out of the domain struct.
    let users = rows
        .into_iter()
        .map(|r| User {
            id: r.get("id"),
            username: r.get("username"),
            password_hash: r.get("password_hash"),
            is_admin: r.get("is_admin"),
            created_at: r.get("created_at"),
        })
        .collect();
    Ok(Json(users))
}

#[derive(Serialize)]
struct AdminEntryView {
    id: Uuid,
    username: String,
    project: String,
    hours: f64,
    year: i32,
    month: i32,
    display_month: String,
    notes: Option<String>,
    created_at: OffsetDateTime,
}

fn admin_entry_view(entry: TimeEntry, username: String, project: String) -> AdminEntryView {
    AdminEntryView {
        id: entry.id,
        username,
        project,
        hours: entry.hours,
        year: entry.year,
        month: entry.month,
        display_month: entry.display_month(),
        notes: entry.notes,
        created_at: entry.created_at,
    }
}

/// Every user's entries, newest first, with owner and project names for the
/// admin panel.
async fn list_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminEntryView>>, (StatusCode, String)> {
    let rows = sqlx::query(
        "SELECT e.id, e.user_id, e.project_id, e.hours, e.year, e.month, e.notes, e.created_at,
                u.username, p.name AS project
         FROM time_entries e
         JOIN users u ON u.id = e.user_id
         JOIN projects p ON p.id = e.project_id
         ORDER BY e.created_at DESC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(internal_error)?;

    let entries = rows
        .into_iter()
        .map(|r| {
            let entry = TimeEntry {
                id: r.get("id"),
                user_id: r.get("user_id"),
                project_id: r.get("project_id"),
                hours: r.get("hours"),
                year: r.get("year"),
                month: r.get("month"),
                notes: r.get("notes"),
                created_at: r.get("created_at"),
            };
            let username = r.get("username");
            let project = r.get("project");
            admin_entry_view(entry, username, project)
        })
        .collect();
    Ok(Json(entries))
}

#[derive(Deserialize)]
struct CreateUserPayload {
    username: String,
    password: String,
    #[serde(default)]
    is_admin: bool,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, String)> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Username and password required".into()));
    }

    let id = Uuid::new_v4();
    let hash = password::hash_password(&payload.password).map_err(internal_error)?;
    let res = sqlx::query(
        "INSERT INTO users (id, username, password_hash, is_admin) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(username)
    .bind(&hash)
    .bind(payload.is_admin)
    .execute(&state.db)
    .await;

    if let Err(e) = res {
        return Err(map_db_error(e));
    }

    tracing::info!(user = username, "user created");
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

#[derive(Deserialize)]
struct UpdateUserPayload {
    username: String,
    /// Blank keeps the current password.
    #[serde(default)]
    password: String,
    #[serde(default)]
    is_admin: bool,
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<StatusCode, (StatusCode, String)> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Username is required".into()));
    }

    let res = sqlx::query("UPDATE users SET username = $1, is_admin = $2 WHERE id = $3")
        .bind(username)
        .bind(payload.is_admin)
        .bind(id)
        .execute(&state.db)
        .await;
    match res {
        Err(e) => return Err(map_db_error(e)),
        Ok(r) if r.rows_affected() == 0 => {
            return Err((StatusCode::NOT_FOUND, "User not found".into()));
        }
        Ok(_) => {}
    }

    if !payload.password.trim().is_empty() {
        let hash = password::hash_password(&payload.password).map_err(internal_error)?;
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&hash)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(internal_error)?;
    }

    tracing::info!(user = username, "user updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if claims_user_id(&claims)? == id {
        return Err((StatusCode::BAD_REQUEST, "Cannot delete your own account".into()));
    }

    // Entries go with the user (ON DELETE CASCADE); their projects stay.
    let res = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(internal_error)?;

    if res.rows_affected() == 0 {
        return Err((StatusCode::NOT_FOUND, "User not found".into()));
    }
    tracing::info!(%id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn map_db_error(err: sqlx::Error) -> (StatusCode, String) {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint().is_some() {
            return (StatusCode::CONFLICT, "Username already exists".into());
        }
    }
    internal_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_view_carries_owner_project_and_display_month() {
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            hours: 7.5,
            year: 2025,
            month: 4,
            notes: Some("revue de code".into()),
            created_at: OffsetDateTime::now_utc(),
        };
        let id = entry.id;

        let view = admin_entry_view(entry, "htepa".into(), "Application Mobile".into());
        assert_eq!(view.id, id);
        assert_eq!(view.username, "htepa");
        assert_eq!(view.project, "Application Mobile");
        assert_eq!(view.hours, 7.5);
        assert_eq!(view.display_month, "Avril 2025");
    }
}
