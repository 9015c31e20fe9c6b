//! Snapshot of an in-progress session.
//!
//! Saving the plan and position lets a session survive the host being
//! suspended or killed. Writes are atomic and locked; a missing or
//! unreadable snapshot simply means there is nothing to resume.

use crate::progression::ProgressionState;
use crate::{Error, Result, SessionPayload};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Everything needed to reopen a session where it stopped
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub workout_id: Uuid,
    pub name: String,
    pub session: SessionPayload,
    pub progression: ProgressionState,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Load a snapshot with shared locking
    ///
    /// Returns `None` if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::debug!("No session snapshot at {:?}", path);
            return Ok(None);
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open snapshot {:?}: {}. Ignoring it.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock snapshot {:?}: {}. Ignoring it.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        if let Err(e) = read {
            tracing::warn!("Failed to read snapshot {:?}: {}. Ignoring it.", path, e);
            return Ok(None);
        }

        match serde_json::from_str::<SessionSnapshot>(&contents) {
            Ok(snapshot) => {
                tracing::debug!("Loaded session snapshot from {:?}", path);
                Ok(Some(snapshot))
            }
            Err(e) => {
                tracing::warn!("Failed to parse snapshot {:?}: {}. Ignoring it.", path, e);
                Ok(None)
            }
        }
    }

    /// Save atomically: temp file, fsync, rename over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("snapshot path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved session snapshot to {:?}", path);
        Ok(())
    }

    /// Remove the snapshot once its session is finalized
    pub fn clear(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
