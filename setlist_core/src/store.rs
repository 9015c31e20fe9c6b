//! Versioned workout log.
//!
//! Each save of a workout appends its full record as one JSON line, so a
//! workout saved open and later finished appears twice under one id.
//! [`load_workouts`] folds the log back to the latest version of each.

use crate::{Error, Result, Workout};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Destination for new workout records
pub trait WorkoutSink {
    fn append(&mut self, workout: &Workout) -> Result<()>;
}

/// Append-only JSONL workout log guarded by an exclusive file lock
pub struct JsonlWorkoutStore {
    path: PathBuf,
}

impl JsonlWorkoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a newer version of a workout that is already in the log.
    ///
    /// `updated_at` is moved forward to `now` so the new line wins when
    /// the log is folded.
    pub fn append_version(&mut self, workout: &mut Workout, now: DateTime<Utc>) -> Result<()> {
        let known = read_log(&self.path)?
            .records
            .iter()
            .any(|record| record.id == workout.id);
        if !known {
            return Err(Error::State(format!(
                "workout {} has no earlier version in {:?}",
                workout.id, self.path
            )));
        }

        workout.updated_at = workout.updated_at.max(now);
        self.write_record(workout)?;
        tracing::debug!("Appended new version of workout {}", workout.id);
        Ok(())
    }

    fn write_record(&self, workout: &Workout) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        // A crash mid-write can leave a torn last line; start on a fresh one
        let mut line = String::new();
        if ends_mid_line(&mut file)? {
            tracing::warn!("Workout log {:?} ends mid-line, starting a new one", self.path);
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(workout)?);
        line.push('\n');

        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        file.unlock()?;
        Ok(())
    }
}

impl WorkoutSink for JsonlWorkoutStore {
    fn append(&mut self, workout: &Workout) -> Result<()> {
        self.write_record(workout)?;
        tracing::debug!("Appended workout {} to store", workout.id);
        Ok(())
    }
}

fn ends_mid_line(file: &mut File) -> Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Every parsed line of the log, in append order
#[derive(Debug, Default)]
pub struct WorkoutLog {
    pub records: Vec<Workout>,
    /// Lines that could not be parsed
    pub skipped: usize,
}

/// Read the raw log under a shared lock. A missing file is an empty log.
pub fn read_log(path: &Path) -> Result<WorkoutLog> {
    let mut log = WorkoutLog::default();
    if !path.exists() {
        return Ok(log);
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    for (index, line) in BufReader::new(&file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Workout>(&line) {
            Ok(workout) => log.records.push(workout),
            Err(e) => {
                log.skipped += 1;
                tracing::warn!("Skipping unreadable workout at line {}: {}", index + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!(
        "Read {} workout records ({} skipped)",
        log.records.len(),
        log.skipped
    );
    Ok(log)
}

/// Fold versions to the latest per id, in order of first appearance.
///
/// Later lines win ties on `updated_at`.
pub fn latest_versions(records: Vec<Workout>) -> Vec<Workout> {
    let mut slots: HashMap<Uuid, usize> = HashMap::new();
    let mut latest: Vec<Workout> = Vec::new();

    for record in records {
        match slots.get(&record.id) {
            Some(&slot) => {
                if record.updated_at >= latest[slot].updated_at {
                    latest[slot] = record;
                }
            }
            None => {
                slots.insert(record.id, latest.len());
                latest.push(record);
            }
        }
    }
    latest
}

/// Latest version of every workout in the log
pub fn load_workouts(path: &Path) -> Result<Vec<Workout>> {
    Ok(latest_versions(read_log(path)?.records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionPayload;
    use chrono::Duration;

    fn workout(name: &str) -> Workout {
        Workout::new(name, "strength", SessionPayload::default(), Utc::now())
    }

    #[test]
    fn test_append_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store").join("workouts.jsonl");

        let record = workout("Push");
        let mut store = JsonlWorkoutStore::new(&path);
        store.append(&record).unwrap();

        assert_eq!(load_workouts(&path).unwrap(), vec![record]);
    }

    #[test]
    fn test_append_version_supersedes_earlier_line() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");
        let mut store = JsonlWorkoutStore::new(&path);

        let mut legs = workout("Legs");
        let arms = workout("Arms");
        store.append(&legs).unwrap();
        store.append(&arms).unwrap();

        let later = legs.created_at + Duration::minutes(40);
        legs.complete(None, later).unwrap();
        // A clock that went backwards still produces the newest version
        store
            .append_version(&mut legs, later - Duration::hours(2))
            .unwrap();
        assert_eq!(legs.updated_at, later);

        assert_eq!(read_log(&path).unwrap().records.len(), 3);
        let loaded = load_workouts(&path).unwrap();
        let names: Vec<_> = loaded.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Legs", "Arms"]);
        assert!(loaded[0].completed);
    }

    #[test]
    fn test_append_version_requires_known_id() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");
        let mut store = JsonlWorkoutStore::new(&path);

        let mut stranger = workout("Stranger");
        let result = store.append_version(&mut stranger, Utc::now());
        assert!(matches!(result, Err(Error::State(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_torn_line_is_isolated() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");

        let mut store = JsonlWorkoutStore::new(&path);
        store.append(&workout("A")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            write!(file, "{{\"id\":\"trunc").unwrap();
        }
        store.append(&workout("B")).unwrap();

        let log = read_log(&path).unwrap();
        let names: Vec<_> = log.records.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(log.skipped, 1);
    }

    #[test]
    fn test_read_missing_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = read_log(&temp_dir.path().join("missing.jsonl")).unwrap();
        assert!(log.records.is_empty());
        assert_eq!(log.skipped, 0);
    }
}
