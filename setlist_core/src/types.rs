//! Core domain types for the setlist engine.
//!
//! This module defines the entities the engine operates on:
//! - Sets and the exercises that own them
//! - Superset groups and their per-kind configuration
//! - The session payload and the persisted Workout record

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of an exercise instance inside a plan
pub type ExerciseId = Uuid;

/// Stable identity of a superset inside a plan
pub type SupersetId = Uuid;

// ============================================================================
// Sets
// ============================================================================

/// Which field of a set carries the work target
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ExerciseType {
    #[default]
    Repetitions,
    Time,
    Distance,
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseType::Repetitions => write!(f, "rep count"),
            ExerciseType::Time => write!(f, "duration"),
            ExerciseType::Distance => write!(f, "distance"),
        }
    }
}

/// One unit of work
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    /// Target duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub completed: bool,
    /// Measured duration in seconds, written by the exercise timer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Set {
    pub fn with_reps(reps: u32) -> Self {
        Self {
            reps: Some(reps),
            ..Self::default()
        }
    }

    pub fn timed(seconds: u32) -> Self {
        Self {
            duration: Some(seconds),
            ..Self::default()
        }
    }

    pub fn with_distance(distance: f64) -> Self {
        Self {
            distance: Some(distance),
            ..Self::default()
        }
    }

    /// A set is complete iff the field matching `kind` is present and > 0.
    /// Weight is never required.
    pub fn is_complete(&self, kind: ExerciseType) -> bool {
        match kind {
            ExerciseType::Repetitions => self.reps.is_some_and(|r| r > 0),
            ExerciseType::Time => self.duration.is_some_and(|d| d > 0),
            ExerciseType::Distance => self.distance.is_some_and(|d| d > 0.0),
        }
    }

    /// Write a single field
    pub fn apply(&mut self, field: SetField) {
        match field {
            SetField::Reps(v) => self.reps = v,
            SetField::Duration(v) => self.duration = v,
            SetField::Distance(v) => self.distance = v,
            SetField::Weight(v) => self.weight = v,
            SetField::Notes(v) => self.notes = v,
        }
    }
}

/// An edit to one field of the current set
#[derive(Clone, Debug, PartialEq)]
pub enum SetField {
    Reps(Option<u32>),
    Duration(Option<u32>),
    Distance(Option<f64>),
    Weight(Option<f64>),
    Notes(Option<String>),
}

// ============================================================================
// Exercises
// ============================================================================

/// Display-only difficulty tag
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// An exercise instance in a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: ExerciseId,
    /// Identity in the exercise catalog
    pub catalog_id: String,
    pub name: String,
    #[serde(default)]
    pub exercise_type: ExerciseType,
    #[serde(default)]
    pub sets: Vec<Set>,
    /// Rest after each set, in seconds
    #[serde(default)]
    pub rest_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl Exercise {
    pub fn new(catalog_id: impl Into<String>, name: impl Into<String>, kind: ExerciseType) -> Self {
        Self {
            id: Uuid::new_v4(),
            catalog_id: catalog_id.into(),
            name: name.into(),
            exercise_type: kind,
            sets: Vec::new(),
            rest_time: 0,
            muscle_group: None,
            equipment: None,
            difficulty: None,
        }
    }

    /// Replace the sets with `count` copies of `template`
    pub fn with_sets(mut self, count: usize, template: Set) -> Self {
        self.sets = vec![template; count];
        self
    }

    pub fn with_rest(mut self, seconds: u32) -> Self {
        self.rest_time = seconds;
        self
    }

    /// Number of sets flagged as completed
    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }
}

// ============================================================================
// Supersets
// ============================================================================

/// Grouping kind of a superset
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SupersetKind {
    Superset,
    Triset,
    Circuit,
    Megacircuit,
}

/// Fixed rules attached to each superset kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupersetRules {
    pub min_exercises: usize,
    pub max_exercises: usize,
    pub has_exercise_rest: bool,
    pub allow_timed_sets: bool,
}

impl SupersetKind {
    pub const ALL: [SupersetKind; 4] = [
        SupersetKind::Superset,
        SupersetKind::Triset,
        SupersetKind::Circuit,
        SupersetKind::Megacircuit,
    ];

    pub fn rules(self) -> SupersetRules {
        match self {
            SupersetKind::Superset => SupersetRules {
                min_exercises: 2,
                max_exercises: 2,
                has_exercise_rest: false,
                allow_timed_sets: false,
            },
            SupersetKind::Triset => SupersetRules {
                min_exercises: 3,
                max_exercises: 3,
                has_exercise_rest: false,
                allow_timed_sets: false,
            },
            SupersetKind::Circuit => SupersetRules {
                min_exercises: 3,
                max_exercises: 8,
                has_exercise_rest: true,
                allow_timed_sets: true,
            },
            SupersetKind::Megacircuit => SupersetRules {
                min_exercises: 9,
                max_exercises: 12,
                has_exercise_rest: true,
                allow_timed_sets: true,
            },
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SupersetKind::Superset => "Superset",
            SupersetKind::Triset => "Triset",
            SupersetKind::Circuit => "Circuit",
            SupersetKind::Megacircuit => "Megacircuit",
        }
    }
}

impl fmt::Display for SupersetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A group of exercises performed back-to-back for a number of rounds.
///
/// Each member exercise carries exactly one representative set that is
/// reused for every round. `round_completed` always has `total_rounds`
/// entries; the fields that guard this are private.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Superset {
    pub id: SupersetId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SupersetKind,
    pub exercises: Vec<Exercise>,
    total_rounds: u32,
    current_round: u32,
    round_completed: Vec<bool>,
    /// Rest between rounds, in seconds
    pub rest_between_rounds: u32,
    /// Rest between exercises inside a round, in seconds. Ignored unless the
    /// kind allows it; 0 disables it.
    #[serde(default)]
    pub rest_between_exercises: u32,
    pub created_at: DateTime<Utc>,
}

impl Superset {
    pub fn new(
        name: impl Into<String>,
        kind: SupersetKind,
        exercises: Vec<Exercise>,
        total_rounds: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        let total_rounds = total_rounds.max(1);
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            exercises,
            total_rounds,
            current_round: 1,
            round_completed: vec![false; total_rounds as usize],
            rest_between_rounds: 0,
            rest_between_exercises: 0,
            created_at,
        }
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// 1-indexed
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn round_completed(&self) -> &[bool] {
        &self.round_completed
    }

    pub fn completed_rounds(&self) -> usize {
        self.round_completed.iter().filter(|done| **done).count()
    }

    /// Reconfigure the number of rounds. This resets round progress.
    pub fn set_total_rounds(&mut self, rounds: u32) {
        self.total_rounds = rounds.max(1);
        self.round_completed = vec![false; self.total_rounds as usize];
        self.current_round = 1;
    }

    /// Move the round cursor, clamped into `1..=total_rounds`
    pub fn set_current_round(&mut self, round: u32) {
        self.current_round = round.clamp(1, self.total_rounds);
    }

    /// Mark a 1-indexed round as done. Out-of-range rounds are ignored.
    pub fn mark_round_completed(&mut self, round: u32) {
        if round == 0 {
            return;
        }
        if let Some(slot) = self.round_completed.get_mut(round as usize - 1) {
            *slot = true;
        }
    }

    /// Inter-exercise rest, if this kind uses it and it is enabled
    pub fn exercise_rest(&self) -> Option<u32> {
        (self.kind.rules().has_exercise_rest && self.rest_between_exercises > 0)
            .then_some(self.rest_between_exercises)
    }

    pub fn contains(&self, exercise_id: ExerciseId) -> bool {
        self.exercises.iter().any(|e| e.id == exercise_id)
    }

    /// Restore the round invariants after loading from an external store
    pub(crate) fn normalize(&mut self) {
        self.total_rounds = self.total_rounds.max(1);
        self.round_completed.resize(self.total_rounds as usize, false);
        self.current_round = self.current_round.clamp(1, self.total_rounds);
    }
}

// ============================================================================
// Session payload and Workout record
// ============================================================================

/// The serialized exercise/superset lists of one workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub supersets: Vec<Superset>,
}

/// Subjective feedback captured after a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostWorkoutData {
    /// Rate of perceived exertion, 1..=10
    pub rpe: u8,
    pub feeling: String,
    #[serde(default)]
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

/// A workout as an external store keeps it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: Uuid,
    pub date: NaiveDate,
    pub sport: String,
    pub name: String,
    pub session: SessionPayload,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_workout_data: Option<PostWorkoutData>,
}

impl Workout {
    pub fn new(
        name: impl Into<String>,
        sport: impl Into<String>,
        session: SessionPayload,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: now.date_naive(),
            sport: sport.into(),
            name: name.into(),
            session,
            completed: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
            post_workout_data: None,
        }
    }

    /// Mark the workout finished, attaching optional post-workout feedback
    pub fn complete(
        &mut self,
        post: Option<PostWorkoutData>,
        now: DateTime<Utc>,
    ) -> Result<(), crate::ValidationError> {
        if let Some(ref data) = post {
            if !(1..=10).contains(&data.rpe) {
                return Err(crate::ValidationError::RpeOutOfRange(data.rpe));
            }
        }

        self.completed = true;
        self.completed_at = Some(now);
        self.updated_at = now;
        self.post_workout_data = post;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_completeness_follows_type() {
        let set = Set {
            reps: Some(8),
            duration: Some(0),
            weight: None,
            ..Set::default()
        };

        assert!(set.is_complete(ExerciseType::Repetitions));
        assert!(!set.is_complete(ExerciseType::Time));
        assert!(!set.is_complete(ExerciseType::Distance));
    }

    #[test]
    fn test_zero_target_is_incomplete() {
        assert!(!Set::with_reps(0).is_complete(ExerciseType::Repetitions));
        assert!(!Set::with_distance(0.0).is_complete(ExerciseType::Distance));
        assert!(Set::with_distance(0.5).is_complete(ExerciseType::Distance));
    }

    #[test]
    fn test_round_flags_track_total_rounds() {
        let mut superset = Superset::new("A", SupersetKind::Superset, vec![], 3, Utc::now());
        assert_eq!(superset.round_completed().len(), 3);

        superset.mark_round_completed(2);
        superset.mark_round_completed(7);
        assert_eq!(superset.round_completed(), &[false, true, false]);

        superset.set_total_rounds(5);
        assert_eq!(superset.round_completed().len(), 5);
        assert_eq!(superset.completed_rounds(), 0);

        superset.set_total_rounds(0);
        assert_eq!(superset.total_rounds(), 1);
        assert_eq!(superset.round_completed().len(), 1);
    }

    #[test]
    fn test_exercise_rest_requires_kind_support() {
        let mut superset = Superset::new("A", SupersetKind::Triset, vec![], 2, Utc::now());
        superset.rest_between_exercises = 20;
        assert_eq!(superset.exercise_rest(), None);

        superset.kind = SupersetKind::Circuit;
        assert_eq!(superset.exercise_rest(), Some(20));

        superset.rest_between_exercises = 0;
        assert_eq!(superset.exercise_rest(), None);
    }

    #[test]
    fn test_superset_wire_format() {
        let superset = Superset::new("Legs", SupersetKind::Megacircuit, vec![], 2, Utc::now());
        let json = serde_json::to_value(&superset).unwrap();

        assert_eq!(json["type"], "megacircuit");
        assert_eq!(json["totalRounds"], 2);
        assert_eq!(json["roundCompleted"], serde_json::json!([false, false]));
    }

    #[test]
    fn test_workout_complete_validates_rpe() {
        let now = Utc::now();
        let mut workout = Workout::new("Push", "strength", SessionPayload::default(), now);

        let bad = PostWorkoutData {
            rpe: 11,
            feeling: "great".into(),
            notes: String::new(),
            timestamp: now,
        };
        assert_eq!(
            workout.complete(Some(bad), now),
            Err(crate::ValidationError::RpeOutOfRange(11))
        );
        assert!(!workout.completed);

        workout.complete(None, now).unwrap();
        assert!(workout.completed);
        assert_eq!(workout.completed_at, Some(now));
    }
}
