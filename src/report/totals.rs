//! Per-project hour totals for one user's entries.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::domain::time_entry::TimeEntry;

/// Total hours per project over an immutable snapshot of entries.
///
/// A plain group-by + sum; the dashboard summary endpoint feeds it the
/// caller's entries and joins project names afterwards.
pub fn hours_by_project(entries: &[TimeEntry]) -> BTreeMap<Uuid, f64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.project_id).or_insert(0.0) += entry.hours;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::OffsetDateTime;

    fn entry(project_id: Uuid, hours: f64) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            project_id,
            hours,
            year: 2025,
            month: 6,
            notes: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn sums_hours_per_project() {
        let alpha = Uuid::new_v4();
        let beta = Uuid::new_v4();
        let entries = vec![entry(alpha, 2.0), entry(beta, 1.5), entry(alpha, 3.0)];

        let totals = hours_by_project(&entries);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&alpha], 5.0);
        assert_eq!(totals[&beta], 1.5);
    }

    #[test]
    fn empty_snapshot_yields_empty_totals() {
        assert!(hours_by_project(&[]).is_empty());
    }
}
