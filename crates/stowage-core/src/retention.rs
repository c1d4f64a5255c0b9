//! Retention planning: decide which artifacts have aged out.
//!
//! Planning is pure. The planner looks only at the artifact timestamps it is
//! given and produces a [`RetentionPlan`]; deleting files and updating history
//! is the synchronizer's job.

use serde::{Deserialize, Serialize};

use crate::domain::Artifact;

/// Age-based retention, measured from the newest artifact.
///
/// Wall-clock time plays no part: a storage directory that has not produced a
/// backup for a month still keeps its most recent window intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub max_age_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { max_age_days: 3 }
    }
}

impl RetentionPolicy {
    pub fn days(max_age_days: u32) -> Self {
        Self { max_age_days }
    }

    pub fn max_age(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::days(i64::from(self.max_age_days))
    }
}

/// Outcome of a planning pass. Both lists are sorted oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    pub retained: Vec<Artifact>,
    pub expired: Vec<Artifact>,
}

impl RetentionPlan {
    pub fn is_noop(&self) -> bool {
        self.expired.is_empty()
    }
}

/// Splits `artifacts` into retained and expired under `policy`.
///
/// An artifact expires only once its next newer neighbour is itself older
/// than the window edge (newest timestamp minus `max_age_days`). Keeping the
/// newest artifact at or before the edge means any instant inside the window
/// still has a restore point; the newest artifact overall never expires.
///
/// Input order does not matter. Output order is deterministic: sorted by
/// timestamp, ties broken by name.
pub fn plan(mut artifacts: Vec<Artifact>, policy: &RetentionPolicy) -> RetentionPlan {
    artifacts.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut result = RetentionPlan::default();
    let Some(newest_at) = artifacts.last().map(|a| a.created_at) else {
        return result;
    };
    let max_age = policy.max_age();

    let stamps: Vec<_> = artifacts.iter().map(|a| a.created_at).collect();
    for (i, artifact) in artifacts.into_iter().enumerate() {
        let aged_out = stamps
            .get(i + 1)
            .is_some_and(|next_newer| newest_at - *next_newer > max_age);
        if aged_out {
            result.expired.push(artifact);
        } else {
            result.retained.push(artifact);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NamingScheme;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, d, 3, 0, 0).unwrap()
    }

    fn artifact_at(at: DateTime<Utc>) -> Artifact {
        let naming = NamingScheme::default();
        let name = naming.file_name(at);
        Artifact {
            path: std::path::Path::new("/vault").join(&name),
            name,
            created_at: at,
        }
    }

    fn names(artifacts: &[Artifact]) -> Vec<&str> {
        artifacts.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn empty_input_plans_nothing() {
        let plan = plan(Vec::new(), &RetentionPolicy::days(3));
        assert!(plan.retained.is_empty());
        assert!(plan.expired.is_empty());
        assert!(plan.is_noop());
    }

    #[test]
    fn everything_inside_window_is_retained() {
        let artifacts = vec![artifact_at(day(8)), artifact_at(day(9)), artifact_at(day(10))];
        let plan = plan(artifacts, &RetentionPolicy::days(3));
        assert_eq!(plan.retained.len(), 3);
        assert!(plan.expired.is_empty());
    }

    #[test]
    fn gap_older_than_window_keeps_one_artifact_past_the_edge() {
        // Newest is day 10, window reaches back to day 7. Day 3 stays because
        // its next newer neighbour (day 10) is past the edge: without day 3,
        // an instant like day 7 would have no restore point at or before it.
        let artifacts = vec![
            artifact_at(day(1)),
            artifact_at(day(2)),
            artifact_at(day(3)),
            artifact_at(day(10)),
        ];
        let plan = plan(artifacts, &RetentionPolicy::days(3));
        assert_eq!(
            names(&plan.expired),
            vec![
                "backup_20260801_030000.tar.zst",
                "backup_20260802_030000.tar.zst"
            ]
        );
        assert_eq!(
            names(&plan.retained),
            vec![
                "backup_20260803_030000.tar.zst",
                "backup_20260810_030000.tar.zst"
            ]
        );
    }

    #[test]
    fn sole_artifact_survives_any_age() {
        let artifacts = vec![artifact_at(day(1))];
        let plan = plan(artifacts, &RetentionPolicy::days(3));
        assert_eq!(plan.retained.len(), 1);
        assert!(plan.expired.is_empty());
    }

    #[test]
    fn newest_artifact_never_expires() {
        let artifacts = vec![artifact_at(day(1)), artifact_at(day(30))];
        let plan = plan(artifacts, &RetentionPolicy::days(1));
        assert_eq!(names(&plan.retained), vec![
            "backup_20260801_030000.tar.zst",
            "backup_20260830_030000.tar.zst",
        ]);
    }

    #[test]
    fn chain_of_stale_artifacts_collapses_to_window_edge() {
        let artifacts = vec![
            artifact_at(day(1)),
            artifact_at(day(2)),
            artifact_at(day(3)),
            artifact_at(day(4)),
            artifact_at(day(10)),
        ];
        let plan = plan(artifacts, &RetentionPolicy::days(3));
        // Days 1-3 all have a successor older than day 7; day 4 does not.
        assert_eq!(plan.expired.len(), 3);
        assert_eq!(
            names(&plan.retained),
            vec![
                "backup_20260804_030000.tar.zst",
                "backup_20260810_030000.tar.zst"
            ]
        );
    }

    #[test]
    fn exactly_at_the_edge_is_not_expired() {
        // Successor exactly max_age old: strict comparison keeps the artifact.
        let artifacts = vec![artifact_at(day(4)), artifact_at(day(7)), artifact_at(day(10))];
        let plan = plan(artifacts, &RetentionPolicy::days(3));
        assert!(plan.expired.is_empty());
    }

    #[test]
    fn unsorted_input_produces_sorted_plan() {
        let artifacts = vec![artifact_at(day(10)), artifact_at(day(1)), artifact_at(day(3))];
        let plan = plan(artifacts, &RetentionPolicy::days(3));
        assert_eq!(names(&plan.expired), vec!["backup_20260801_030000.tar.zst"]);
        assert_eq!(
            names(&plan.retained),
            vec![
                "backup_20260803_030000.tar.zst",
                "backup_20260810_030000.tar.zst"
            ]
        );
    }
}
