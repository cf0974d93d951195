use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use sqlx::Row;
use std::sync::Arc;
use time::OffsetDateTime;

use super::internal_error;
use crate::report::monthly::{HourBucket, MonthlyShares, Period, monthly_shares};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stats/monthly", get(monthly))
}

/// Stacked-chart data: per project, the percentage of each month's hours
/// over the trailing 12 months. One grouped query, then a pure computation.
async fn monthly(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MonthlyShares>, (StatusCode, String)> {
    let rows = sqlx::query(
        "SELECT p.name, e.year, e.month, SUM(e.hours) AS hours
         FROM time_entries e
         JOIN projects p ON p.id = e.project_id
         GROUP BY p.name, e.year, e.month",
    )
    .fetch_all(&state.db)
    .await
    .map_err(internal_error)?;

    let buckets: Vec<HourBucket> = rows
        .into_iter()
        .map(|r| HourBucket {
            project: r.get("name"),
            year: r.get("year"),
            month: r.get("month"),
            hours: r.get("hours"),
        })
        .collect();

    let now = OffsetDateTime::now_utc();
    let end = Period::new(now.year(), i32::from(u8::from(now.month()))).map_err(internal_error)?;

    let report = monthly_shares(end, &buckets)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    Ok(Json(report))
}
