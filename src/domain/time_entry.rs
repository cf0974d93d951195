use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

const MONTH_NAMES: [&str; 12] = [
    "Janvier",
    "Février",
    "Mars",
    "Avril",
    "Mai",
    "Juin",
    "Juillet",
    "Août",
    "Septembre",
    "Octobre",
    "Novembre",
    "Décembre",
];

/// Hours one user logged against one project for one calendar month.
///
/// Invariants enforced at the write path and by database checks:
/// `hours > 0` and `1 <= month <= 12`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub hours: f64,
    pub year: i32,
    pub month: i32,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

impl TimeEntry {
    /// Full French month display, e.g. `"Avril 2025"`.
    pub fn display_month(&self) -> String {
        let name = MONTH_NAMES
            .get((self.month - 1) as usize)
            .copied()
            .unwrap_or("Inconnu");
        format!("{} {}", name, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(year: i32, month: i32) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            hours: 1.0,
            year,
            month,
            notes: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn display_month_is_french() {
        assert_eq!(entry(2025, 4).display_month(), "Avril 2025");
        assert_eq!(entry(2024, 12).display_month(), "Décembre 2024");
    }
}
