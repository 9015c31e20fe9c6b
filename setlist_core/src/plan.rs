//! The mutable exercise and superset lists of one workout.
//!
//! Items are addressed by stable id so that reordering or deleting never
//! invalidates a handle held elsewhere. Station order is derived on demand
//! through [`build_stations`].

use crate::builder::SupersetBuilder;
use crate::sequencer::{build_stations, Station};
use crate::{Exercise, ExerciseId, SessionPayload, Superset, SupersetId, ValidationError};
use chrono::{DateTime, Local};

/// A destructive action awaiting explicit confirmation
#[derive(Clone, Debug, PartialEq)]
pub enum PendingDeletion {
    Exercise {
        id: ExerciseId,
        name: String,
    },
    /// Deleting a superset hands its exercises back to the standalone list
    Superset {
        id: SupersetId,
        name: String,
        returning: usize,
    },
}

impl PendingDeletion {
    /// Human-readable confirmation prompt
    pub fn prompt(&self) -> String {
        match self {
            PendingDeletion::Exercise { name, .. } => format!("Delete exercise '{}'?", name),
            PendingDeletion::Superset { name, returning, .. } => format!(
                "Delete '{}'? Its {} exercises will return to the exercise list.",
                name, returning
            ),
        }
    }
}

/// Standalone exercises plus supersets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkoutPlan {
    exercises: Vec<Exercise>,
    supersets: Vec<Superset>,
}

impl WorkoutPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize from a stored payload, repairing anything that would
    /// break the engine's invariants
    pub fn from_payload(payload: SessionPayload) -> Self {
        let SessionPayload {
            mut exercises,
            mut supersets,
        } = payload;

        for superset in &mut supersets {
            superset.normalize();
        }

        let before = exercises.len();
        exercises.retain(|e| !supersets.iter().any(|s| s.contains(e.id)));
        if exercises.len() != before {
            tracing::warn!(
                "Dropped {} standalone exercises already owned by a superset",
                before - exercises.len()
            );
        }

        tracing::debug!(
            "Loaded plan with {} exercises and {} supersets",
            exercises.len(),
            supersets.len()
        );
        Self {
            exercises,
            supersets,
        }
    }

    pub fn to_payload(&self) -> SessionPayload {
        SessionPayload {
            exercises: self.exercises.clone(),
            supersets: self.supersets.clone(),
        }
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn supersets(&self) -> &[Superset] {
        &self.supersets
    }

    pub fn stations(&self) -> Vec<Station<'_>> {
        build_stations(&self.exercises, &self.supersets)
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty() && self.supersets.is_empty()
    }

    pub fn exercise(&self, id: ExerciseId) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn exercise_mut(&mut self, id: ExerciseId) -> Option<&mut Exercise> {
        self.exercises.iter_mut().find(|e| e.id == id)
    }

    pub fn superset(&self, id: SupersetId) -> Option<&Superset> {
        self.supersets.iter().find(|s| s.id == id)
    }

    pub fn superset_mut(&mut self, id: SupersetId) -> Option<&mut Superset> {
        self.supersets.iter_mut().find(|s| s.id == id)
    }

    /// Position of a superset in creation order
    pub fn superset_index(&self, id: SupersetId) -> Option<usize> {
        self.supersets.iter().position(|s| s.id == id)
    }

    pub fn add_exercise(&mut self, exercise: Exercise) {
        tracing::debug!("Added exercise {} ({})", exercise.name, exercise.id);
        self.exercises.push(exercise);
    }

    /// Validate the builder and, if it passes, append the new superset and
    /// pull its members out of the standalone list in one step.
    pub fn create_superset(
        &mut self,
        builder: &SupersetBuilder,
        now: DateTime<Local>,
    ) -> Result<SupersetId, ValidationError> {
        let superset = builder.build(now)?;
        let id = superset.id;

        self.exercises.retain(|e| !superset.contains(e.id));
        tracing::info!(
            "Created {} '{}' with {} exercises",
            superset.kind,
            superset.name,
            superset.exercises.len()
        );
        self.supersets.push(superset);
        Ok(id)
    }

    pub fn request_delete_exercise(&self, id: ExerciseId) -> Option<PendingDeletion> {
        self.exercise(id).map(|e| PendingDeletion::Exercise {
            id,
            name: e.name.clone(),
        })
    }

    pub fn request_delete_superset(&self, id: SupersetId) -> Option<PendingDeletion> {
        self.superset(id).map(|s| PendingDeletion::Superset {
            id,
            name: s.name.clone(),
            returning: s.exercises.len(),
        })
    }

    /// Apply a confirmed deletion. Returns false if the target is gone.
    pub fn confirm_deletion(&mut self, pending: &PendingDeletion) -> bool {
        match pending {
            PendingDeletion::Exercise { id, name } => {
                let before = self.exercises.len();
                self.exercises.retain(|e| e.id != *id);
                let removed = self.exercises.len() != before;
                if removed {
                    tracing::info!("Deleted exercise '{}'", name);
                }
                removed
            }
            PendingDeletion::Superset { id, name, .. } => {
                let Some(index) = self.superset_index(*id) else {
                    return false;
                };
                let superset = self.supersets.remove(index);
                tracing::info!(
                    "Deleted '{}', returning {} exercises",
                    name,
                    superset.exercises.len()
                );
                self.exercises.extend(superset.exercises);
                true
            }
        }
    }
}
