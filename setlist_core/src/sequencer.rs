//! Station sequencing.
//!
//! Flattens the standalone exercises and the supersets of a workout into
//! the ordered list of stations the user walks through: all standalone
//! exercises first (list order), then all supersets (creation order).

use crate::{Exercise, ExerciseId, Superset, SupersetId};
use std::collections::HashSet;

/// One unit of the workout traversal
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Station<'a> {
    Exercise(&'a Exercise),
    Superset(&'a Superset),
}

/// Id-based handle to a station that survives list mutations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StationKey {
    Exercise(ExerciseId),
    Superset(SupersetId),
}

impl<'a> Station<'a> {
    pub fn key(&self) -> StationKey {
        match self {
            Station::Exercise(e) => StationKey::Exercise(e.id),
            Station::Superset(s) => StationKey::Superset(s.id),
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Station::Exercise(e) => &e.name,
            Station::Superset(s) => &s.name,
        }
    }
}

/// Build the station list. Pure; call it again after every mutation.
///
/// Exercises that also appear inside a superset are left out of the
/// standalone part so nothing is traversed twice.
pub fn build_stations<'a>(
    exercises: &'a [Exercise],
    supersets: &'a [Superset],
) -> Vec<Station<'a>> {
    let grouped: HashSet<ExerciseId> = supersets
        .iter()
        .flat_map(|s| s.exercises.iter().map(|e| e.id))
        .collect();

    let mut stations: Vec<Station<'a>> = exercises
        .iter()
        .filter(|e| !grouped.contains(&e.id))
        .map(Station::Exercise)
        .collect();

    stations.extend(supersets.iter().map(Station::Superset));
    stations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseType, Set, SupersetKind};
    use chrono::Utc;

    fn exercise(name: &str) -> Exercise {
        Exercise::new(name, name, ExerciseType::Repetitions).with_sets(3, Set::with_reps(10))
    }

    #[test]
    fn test_standalone_first_then_supersets() {
        let exercises = vec![exercise("squat"), exercise("bench")];
        let supersets = vec![
            Superset::new(
                "A",
                SupersetKind::Superset,
                vec![exercise("curl"), exercise("dip")],
                3,
                Utc::now(),
            ),
            Superset::new(
                "B",
                SupersetKind::Superset,
                vec![exercise("row"), exercise("fly")],
                3,
                Utc::now(),
            ),
        ];

        let stations = build_stations(&exercises, &supersets);
        let names: Vec<_> = stations.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["squat", "bench", "A", "B"]);
        assert!(matches!(stations[2], Station::Superset(_)));
    }

    #[test]
    fn test_grouped_exercises_are_excluded() {
        let shared = exercise("curl");
        let exercises = vec![exercise("squat"), shared.clone()];
        let supersets = vec![Superset::new(
            "A",
            SupersetKind::Superset,
            vec![shared, exercise("dip")],
            2,
            Utc::now(),
        )];

        let stations = build_stations(&exercises, &supersets);
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name(), "squat");
        assert_eq!(stations[1].key(), StationKey::Superset(supersets[0].id));
    }

    #[test]
    fn test_empty_plan_has_no_stations() {
        assert!(build_stations(&[], &[]).is_empty());
    }
}
