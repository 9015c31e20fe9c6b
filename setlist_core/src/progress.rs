//! Completion predicates and progress percentages.
//!
//! Whole-session progress weights every superset round by the number of
//! exercises in it, so a finished round of a four-exercise circuit counts
//! as four sets.

use crate::sequencer::build_stations;
use crate::{Exercise, ExerciseType, Set, Superset};

pub fn is_set_complete(set: &Set, kind: ExerciseType) -> bool {
    set.is_complete(kind)
}

/// Every configured set is valid AND every round is done
pub fn is_superset_complete(superset: &Superset) -> bool {
    let sets_valid = superset
        .exercises
        .iter()
        .all(|e| e.sets.iter().all(|s| is_set_complete(s, e.exercise_type)));
    let rounds_done = superset.round_completed().iter().all(|done| *done);
    sets_valid && rounds_done
}

/// Percentage of rounds completed
pub fn superset_progress(superset: &Superset) -> f64 {
    if superset.total_rounds() == 0 {
        return 0.0;
    }
    superset.completed_rounds() as f64 / f64::from(superset.total_rounds()) * 100.0
}

/// Set counts behind a progress percentage
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SessionProgress {
    pub completed_sets: usize,
    pub total_sets: usize,
}

impl SessionProgress {
    /// 0 when there is nothing to do
    pub fn percent(&self) -> f64 {
        if self.total_sets == 0 {
            return 0.0;
        }
        self.completed_sets as f64 / self.total_sets as f64 * 100.0
    }

    pub fn is_finished(&self) -> bool {
        self.total_sets > 0 && self.completed_sets >= self.total_sets
    }
}

/// Count sets across standalone exercises and supersets
pub fn session_progress(exercises: &[Exercise], supersets: &[Superset]) -> SessionProgress {
    // Standalone copies of grouped exercises must not be counted twice
    let standalone = build_stations(exercises, supersets)
        .into_iter()
        .filter_map(|station| match station {
            crate::Station::Exercise(e) => Some(e),
            crate::Station::Superset(_) => None,
        });

    let mut progress = SessionProgress::default();
    for exercise in standalone {
        progress.total_sets += exercise.sets.len();
        progress.completed_sets += exercise.completed_sets();
    }
    for superset in supersets {
        let width = superset.exercises.len();
        progress.total_sets += superset.total_rounds() as usize * width;
        progress.completed_sets += superset.completed_rounds() * width;
    }
    progress
}

/// Whole-session completion percentage
pub fn calculate_progress(exercises: &[Exercise], supersets: &[Superset]) -> f64 {
    session_progress(exercises, supersets).percent()
}
