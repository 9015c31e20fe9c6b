//! Workout history with a trailing window.
//!
//! The store is append-only, so one workout id may appear several times.
//! History keeps the most recently updated version of each.

use crate::store::{latest_versions, read_log};
use crate::{Result, Workout};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Load workouts created in the last `days` days, newest first
pub fn load_recent_workouts(path: &Path, days: i64, now: DateTime<Utc>) -> Result<Vec<Workout>> {
    let cutoff = now - Duration::days(days);
    let log = read_log(path)?;
    let total = log.records.len();

    let mut workouts: Vec<_> = latest_versions(log.records)
        .into_iter()
        .filter(|w| w.created_at >= cutoff)
        .collect();
    workouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    tracing::info!(
        "Loaded {} workouts ({} records) from last {} days",
        workouts.len(),
        total,
        days
    );
    Ok(workouts)
}

/// Most recent workout for a sport (input sorted newest first)
pub fn find_last_by_sport<'a>(workouts: &'a [Workout], sport: &str) -> Option<&'a Workout> {
    workouts
        .iter()
        .find(|w| w.sport.eq_ignore_ascii_case(sport))
}
