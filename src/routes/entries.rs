use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::sync::Arc;
use uuid::Uuid;

use super::{claims_user_id, internal_error, is_admin};
use crate::domain::time_entry::TimeEntry;
use crate::report::totals::hours_by_project;
use crate::security::jwt::Claims;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/summary", get(summary))
        .route("/entries/:id", axum::routing::put(update_entry).delete(delete_entry))
}

#[derive(Deserialize)]
struct EntryPayload {
    project_id: Uuid,
    hours: f64,
    year: i32,
    month: i32,
    notes: Option<String>,
}

fn validate_entry(payload: &EntryPayload) -> Result<(), (StatusCode, String)> {
    if !payload.hours.is_finite() || payload.hours <= 0.0 {
        return Err((StatusCode::BAD_REQUEST, "Hours must be positive".into()));
    }
    if !(1..=12).contains(&payload.month) {
        return Err((StatusCode::BAD_REQUEST, "Month must be between 1 and 12".into()));
    }
    Ok(())
}

#[derive(Deserialize)]
struct ListParams {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct EntryView {
    #[serde(flatten)]
    entry: TimeEntry,
    display_month: String,
}

fn entry_from_row(row: &sqlx::postgres::PgRow) -> TimeEntry {
    TimeEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        project_id: row.get("project_id"),
        hours: row.get("hours"),
        year: row.get("year"),
        month: row.get("month"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<EntryView>>, (StatusCode, String)> {
    let user_id = claims_user_id(&claims)?;
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let rows = sqlx::query(
        "SELECT id, user_id, project_id, hours, year, month, notes, created_at
         FROM time_entries WHERE user_id = $1
         ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(&state.db)
    .await
    .map_err(internal_error)?;

    let entries = rows
        .iter()
        .map(|r| {
            let entry = entry_from_row(r);
            let display_month = entry.display_month();
            EntryView { entry, display_month }
        })
        .collect();
    Ok(Json(entries))
}

#[derive(Serialize)]
struct ProjectHours {
    project_id: Uuid,
    name: String,
    total_hours: f64,
}

/// The caller's all-time hours per project: snapshot the entries, run the
/// pure reduction, then join the project names.
async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ProjectHours>>, (StatusCode, String)> {
    let user_id = claims_user_id(&claims)?;

    let rows = sqlx::query(
        "SELECT id, user_id, project_id, hours, year, month, notes, created_at
         FROM time_entries WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(internal_error)?;
    let entries: Vec<TimeEntry> = rows.iter().map(entry_from_row).collect();

    let totals = hours_by_project(&entries);

    let name_rows = sqlx::query("SELECT id, name FROM projects")
        .fetch_all(&state.db)
        .await
        .map_err(internal_error)?;

    let mut out: Vec<ProjectHours> = name_rows
        .into_iter()
        .filter_map(|r| {
            let id: Uuid = r.get("id");
            totals.get(&id).map(|hours| ProjectHours {
                project_id: id,
                name: r.get("name"),
                total_hours: *hours,
            })
        })
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(out))
}

async fn create_entry(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EntryPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, String)> {
    validate_entry(&payload)?;
    let user_id = claims_user_id(&claims)?;
    ensure_project_exists(&state, payload.project_id).await?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO time_entries (id, user_id, project_id, hours, year, month, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(id)
    .bind(user_id)
    .bind(payload.project_id)
    .bind(payload.hours)
    .bind(payload.year)
    .bind(payload.month)
    .bind(payload.notes.as_deref())
    .execute(&state.db)
    .await
    .map_err(map_entry_db_error)?;

    tracing::info!(%user_id, hours = payload.hours, "time logged");
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EntryPayload>,
) -> Result<StatusCode, (StatusCode, String)> {
    validate_entry(&payload)?;
    load_owned_entry(&state, &claims, id).await?;
    ensure_project_exists(&state, payload.project_id).await?;

    sqlx::query(
        "UPDATE time_entries SET project_id = $1, hours = $2, year = $3, month = $4, notes = $5
         WHERE id = $6",
    )
    .bind(payload.project_id)
    .bind(payload.hours)
    .bind(payload.year)
    .bind(payload.month)
    .bind(payload.notes.as_deref())
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(map_entry_db_error)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    load_owned_entry(&state, &claims, id).await?;

    sqlx::query("DELETE FROM time_entries WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(internal_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// 400 "Unknown project" on both the create and the update path.
async fn ensure_project_exists(
    state: &Arc<AppState>,
    project_id: Uuid,
) -> Result<(), (StatusCode, String)> {
    let project = sqlx::query("SELECT id FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(&state.db)
        .await
        .map_err(internal_error)?;
    if project.is_none() {
        return Err((StatusCode::BAD_REQUEST, "Unknown project".into()));
    }
    Ok(())
}

/// Catches the race where the project is deleted between the existence
/// check and the write.
fn map_entry_db_error(err: sqlx::Error) -> (StatusCode, String) {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return (StatusCode::BAD_REQUEST, "Unknown project".into());
        }
    }
    internal_error(err)
}

/// 404 if missing, 403 unless the caller owns the entry or is an admin.
async fn load_owned_entry(
    state: &Arc<AppState>,
    claims: &Claims,
    id: Uuid,
) -> Result<(), (StatusCode, String)> {
    let row = sqlx::query("SELECT user_id FROM time_entries WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(internal_error)?;

    let owner: Uuid = match row {
        Some(r) => r.get("user_id"),
        None => return Err((StatusCode::NOT_FOUND, "Entry not found".into())),
    };

    if owner != claims_user_id(claims)? && !is_admin(claims) {
        return Err((StatusCode::FORBIDDEN, "Not your entry".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(hours: f64, month: i32) -> EntryPayload {
        EntryPayload {
            project_id: Uuid::new_v4(),
            hours,
            year: 2025,
            month,
            notes: None,
        }
    }

    #[test]
    fn rejects_non_positive_hours() {
        assert!(validate_entry(&payload(0.0, 6)).is_err());
        assert!(validate_entry(&payload(-1.5, 6)).is_err());
        assert!(validate_entry(&payload(f64::NAN, 6)).is_err());
        assert!(validate_entry(&payload(7.5, 6)).is_ok());
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert!(validate_entry(&payload(1.0, 0)).is_err());
        assert!(validate_entry(&payload(1.0, 13)).is_err());
        assert!(validate_entry(&payload(1.0, 1)).is_ok());
        assert!(validate_entry(&payload(1.0, 12)).is_ok());
    }

    #[derive(Debug)]
    struct FkViolation;

    impl std::fmt::Display for FkViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("violates foreign key constraint")
        }
    }

    impl std::error::Error for FkViolation {}

    impl sqlx::error::DatabaseError for FkViolation {
        fn message(&self) -> &str {
            "violates foreign key constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::ForeignKeyViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn writing_against_an_unknown_project_is_a_bad_request() {
        let (status, message) = map_entry_db_error(sqlx::Error::Database(Box::new(FkViolation)));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Unknown project");

        let (status, _) = map_entry_db_error(sqlx::Error::RowNotFound);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
