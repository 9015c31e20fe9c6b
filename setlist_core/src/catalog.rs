//! Exercise catalog lookup.
//!
//! The engine treats catalog data as opaque: it only copies identity and
//! display metadata into new [`Exercise`] instances. A small built-in
//! catalog backs the CLI; hosts can plug in their own [`ExerciseCatalog`].

use crate::types::*;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Catalog entry for one exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseInfo {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub equipment: String,
    pub difficulty: Difficulty,
    pub exercise_type: ExerciseType,
    pub description: String,
}

impl ExerciseInfo {
    /// New exercise instance with `count` copies of `template`
    pub fn instantiate(&self, count: usize, template: Set, rest_seconds: u32) -> Exercise {
        let mut exercise = Exercise::new(self.id.clone(), self.name.clone(), self.exercise_type)
            .with_sets(count, template)
            .with_rest(rest_seconds);
        exercise.muscle_group = Some(self.muscle_group.clone());
        exercise.equipment = Some(self.equipment.clone());
        exercise.difficulty = Some(self.difficulty);
        exercise
    }
}

/// Source of exercise identity and metadata
pub trait ExerciseCatalog {
    fn get(&self, id: &str) -> Option<&ExerciseInfo>;

    /// Case-insensitive match on name, muscle group or equipment
    fn search(&self, query: &str) -> Vec<&ExerciseInfo>;
}

/// In-memory catalog keeping insertion order for listings
#[derive(Clone, Debug, Default)]
pub struct BuiltinCatalog {
    entries: Vec<ExerciseInfo>,
    by_id: HashMap<String, usize>,
}

impl BuiltinCatalog {
    pub fn from_entries(entries: Vec<ExerciseInfo>) -> Self {
        let by_id = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        Self { entries, by_id }
    }

    pub fn entries(&self) -> &[ExerciseInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.by_id.len() != self.entries.len() {
            errors.push("Catalog contains duplicate exercise IDs".to_string());
        }
        for entry in &self.entries {
            if entry.id.is_empty() {
                errors.push(format!("Exercise '{}' has empty ID", entry.name));
            }
            if entry.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", entry.id));
            }
        }

        errors
    }
}

impl ExerciseCatalog for BuiltinCatalog {
    fn get(&self, id: &str) -> Option<&ExerciseInfo> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    fn search(&self, query: &str) -> Vec<&ExerciseInfo> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.muscle_group.to_lowercase().contains(&needle)
                    || e.equipment.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// Cached default catalog - built once and reused
static DEFAULT_CATALOG: Lazy<BuiltinCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static BuiltinCatalog {
    &DEFAULT_CATALOG
}

fn entry(
    id: &str,
    name: &str,
    muscle_group: &str,
    equipment: &str,
    difficulty: Difficulty,
    exercise_type: ExerciseType,
    description: &str,
) -> ExerciseInfo {
    ExerciseInfo {
        id: id.into(),
        name: name.into(),
        muscle_group: muscle_group.into(),
        equipment: equipment.into(),
        difficulty,
        exercise_type,
        description: description.into(),
    }
}

/// Builds the built-in catalog
pub fn build_default_catalog() -> BuiltinCatalog {
    use Difficulty::*;
    use ExerciseType::*;

    BuiltinCatalog::from_entries(vec![
        entry("back_squat", "Back Squat", "legs", "barbell", Intermediate, Repetitions,
            "Bar on upper back, squat to depth and stand."),
        entry("bench_press", "Bench Press", "chest", "barbell", Intermediate, Repetitions,
            "Lower the bar to mid-chest and press."),
        entry("barbell_row", "Barbell Row", "back", "barbell", Intermediate, Repetitions,
            "Hinge forward and row the bar to the lower ribs."),
        entry("pull_up", "Pull-up", "back", "pull-up bar", Advanced, Repetitions,
            "Hang, pull chin over the bar, lower under control."),
        entry("push_up", "Push-up", "chest", "bodyweight", Beginner, Repetitions,
            "Plank position, lower chest to floor, push back up."),
        entry("bicep_curl", "Dumbbell Curl", "arms", "dumbbell", Beginner, Repetitions,
            "Curl the dumbbells keeping elbows pinned."),
        entry("tricep_dip", "Tricep Dip", "arms", "parallel bars", Intermediate, Repetitions,
            "Lower between the bars and press back up."),
        entry("kb_swing", "Kettlebell Swing", "posterior chain", "kettlebell", Intermediate,
            Repetitions,
            "Hinge and snap the hips to float the bell to chest height."),
        entry("walking_lunge", "Walking Lunge", "legs", "bodyweight", Beginner, Repetitions,
            "Step forward into a lunge, alternate legs."),
        entry("plank", "Plank", "core", "bodyweight", Beginner, Time,
            "Hold a straight line from head to heels."),
        entry("jump_rope", "Jump Rope", "conditioning", "jump rope", Beginner, Time,
            "Continuous skipping at a steady rhythm."),
        entry("mountain_climber", "Mountain Climber", "core", "bodyweight", Beginner, Time,
            "Drive knees to chest alternately from a plank."),
        entry("rowing_erg", "Rowing Machine", "conditioning", "rower", Intermediate, Distance,
            "Row for distance at a sustainable pace."),
        entry("run", "Run", "conditioning", "none", Beginner, Distance,
            "Run for distance."),
    ])
}
