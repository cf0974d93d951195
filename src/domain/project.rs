use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_COLOR: &str = "#2563EB";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Hex color used by the chart legend.
    pub color: String,
    pub created_at: OffsetDateTime,
    /// Kept when the creating user is deleted (SET NULL).
    pub created_by: Option<Uuid>,
}
