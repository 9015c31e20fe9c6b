//! CSV rollup of the workout store.
//!
//! Appends one summary row per workout to a CSV file, then archives the
//! store file so the next session starts a fresh one.

use crate::progress::session_progress;
use crate::sequencer::build_stations;
use crate::{Result, Workout};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    sport: String,
    name: String,
    completed: bool,
    completed_at: Option<String>,
    stations: usize,
    total_sets: usize,
    completed_sets: usize,
    progress_pct: String,
    rpe: Option<u8>,
}

impl From<&Workout> for CsvRow {
    fn from(workout: &Workout) -> Self {
        let payload = &workout.session;
        let progress = session_progress(&payload.exercises, &payload.supersets);
        CsvRow {
            id: workout.id.to_string(),
            date: workout.date.to_string(),
            sport: workout.sport.clone(),
            name: workout.name.clone(),
            completed: workout.completed,
            completed_at: workout.completed_at.map(|t| t.to_rfc3339()),
            stations: build_stations(&payload.exercises, &payload.supersets).len(),
            total_sets: progress.total_sets,
            completed_sets: progress.completed_sets,
            progress_pct: format!("{:.1}", progress.percent()),
            rpe: workout.post_workout_data.as_ref().map(|p| p.rpe),
        }
    }
}

/// Roll the store up into CSV and archive it
///
/// This function:
/// 1. Reads the store and keeps the latest version of each workout
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the store to `.processed`
///
/// The CSV is fsynced before the store is renamed, and the store is renamed
/// rather than deleted so it can be recovered by hand.
pub fn rollup_to_csv(store_path: &Path, csv_path: &Path) -> Result<usize> {
    let mut workouts = crate::store::load_workouts(store_path)?;

    if workouts.is_empty() {
        tracing::info!("No workouts in store to roll up");
        return Ok(0);
    }
    workouts.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a fresh file gets a header row
    let needs_headers = file.metadata()?.len() == 0;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for workout in &workouts {
        writer.serialize(CsvRow::from(workout))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workouts to CSV", workouts.len());

    let processed_path = store_path.with_extension("jsonl.processed");
    std::fs::rename(store_path, &processed_path)?;
    tracing::info!("Archived store to {:?}", processed_path);

    Ok(workouts.len())
}

/// Remove archived store files from a directory
pub fn cleanup_processed(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed store: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed store files", count);
    }
    Ok(count)
}
