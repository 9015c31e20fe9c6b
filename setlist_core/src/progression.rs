//! Progression through the station list.
//!
//! This module holds the position tuple of a live session and the pure
//! auto-navigation rules applied after a set is completed:
//! - Superset: next exercise, then next round, then next station
//! - Standalone exercise: next set, then next station
//!
//! The stateful host that applies these rules lives in [`crate::session`].

use crate::sequencer::Station;
use crate::timer::RestContext;
use crate::{Exercise, Superset};
use serde::{Deserialize, Serialize};

/// Where the user is in the workout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionState {
    pub station_index: usize,
    /// 0 when the current station is a standalone exercise
    pub exercise_in_superset: usize,
    pub set_index: usize,
    /// 1-indexed; only meaningful on a superset station
    pub round: u32,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::at_station(0)
    }
}

impl ProgressionState {
    /// Beginning of the given station
    pub fn at_station(station_index: usize) -> Self {
        Self {
            station_index,
            exercise_in_superset: 0,
            set_index: 0,
            round: 1,
        }
    }

    /// Check the position against a station list
    pub fn is_valid_for(&self, stations: &[Station<'_>]) -> bool {
        match stations.get(self.station_index) {
            Some(Station::Exercise(e)) => {
                self.exercise_in_superset == 0
                    && self.round == 1
                    && (e.sets.is_empty() || self.set_index < e.sets.len())
            }
            Some(Station::Superset(s)) => {
                self.set_index == 0
                    && self.exercise_in_superset < s.exercises.len()
                    && (1..=s.total_rounds()).contains(&self.round)
            }
            None => false,
        }
    }
}

/// A rest interval to start after moving on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestRequest {
    pub seconds: u32,
    pub context: RestContext,
}

impl RestRequest {
    /// Zero-length rests are not worth a timer
    fn positive(seconds: u32, context: RestContext) -> Option<Self> {
        (seconds > 0).then_some(Self { seconds, context })
    }
}

/// The move made after a completed set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Next exercise in the same superset round
    NextExercise { rest: Option<RestRequest> },
    /// First exercise of the next superset round
    NextRound { round: u32, rest: Option<RestRequest> },
    /// Next set of a standalone exercise
    NextSet { rest: Option<RestRequest> },
    NextStation,
    /// Nothing left to traverse
    Finished,
}

impl Advance {
    pub fn rest(&self) -> Option<RestRequest> {
        match self {
            Advance::NextExercise { rest }
            | Advance::NextRound { rest, .. }
            | Advance::NextSet { rest } => *rest,
            Advance::NextStation | Advance::Finished => None,
        }
    }
}

/// Compute the position after the current set is completed.
///
/// Deterministic and side-effect free. On `Finished` the returned state
/// equals the input.
pub fn auto_navigate(
    state: &ProgressionState,
    station: &Station<'_>,
    station_count: usize,
) -> (ProgressionState, Advance) {
    match station {
        Station::Superset(superset) => navigate_superset(state, superset, station_count),
        Station::Exercise(exercise) => navigate_exercise(state, exercise, station_count),
    }
}

fn navigate_superset(
    state: &ProgressionState,
    superset: &Superset,
    station_count: usize,
) -> (ProgressionState, Advance) {
    if state.exercise_in_superset + 1 < superset.exercises.len() {
        let next = ProgressionState {
            exercise_in_superset: state.exercise_in_superset + 1,
            ..*state
        };
        let rest = superset
            .exercise_rest()
            .and_then(|s| RestRequest::positive(s, RestContext::Exercise));
        return (next, Advance::NextExercise { rest });
    }

    if state.round < superset.total_rounds() {
        let round = state.round + 1;
        let next = ProgressionState {
            exercise_in_superset: 0,
            set_index: 0,
            round,
            ..*state
        };
        let rest = RestRequest::positive(superset.rest_between_rounds, RestContext::Round);
        return (next, Advance::NextRound { round, rest });
    }

    next_station(state, station_count)
}

fn navigate_exercise(
    state: &ProgressionState,
    exercise: &Exercise,
    station_count: usize,
) -> (ProgressionState, Advance) {
    if state.set_index + 1 < exercise.sets.len() {
        let next = ProgressionState {
            set_index: state.set_index + 1,
            ..*state
        };
        let rest = RestRequest::positive(exercise.rest_time, RestContext::Set);
        return (next, Advance::NextSet { rest });
    }

    next_station(state, station_count)
}

fn next_station(state: &ProgressionState, station_count: usize) -> (ProgressionState, Advance) {
    if state.station_index + 1 < station_count {
        (
            ProgressionState::at_station(state.station_index + 1),
            Advance::NextStation,
        )
    } else {
        (*state, Advance::Finished)
    }
}

/// Whether completing the current exercise closes the superset round
pub fn completes_round(state: &ProgressionState, superset: &Superset) -> bool {
    state.exercise_in_superset + 1 >= superset.exercises.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseType, Set, SupersetKind};
    use chrono::Utc;

    fn exercise(name: &str, sets: usize, rest: u32) -> Exercise {
        Exercise::new(name, name, ExerciseType::Repetitions)
            .with_sets(sets, Set::with_reps(10))
            .with_rest(rest)
    }

    fn circuit() -> Superset {
        let exercises = (0..4).map(|i| exercise(&format!("c{}", i), 1, 0)).collect();
        let mut superset = Superset::new("C", SupersetKind::Circuit, exercises, 3, Utc::now());
        superset.rest_between_exercises = 20;
        superset.rest_between_rounds = 90;
        superset
    }

    #[test]
    fn test_circuit_round_robin() {
        let superset = circuit();
        let station = Station::Superset(&superset);
        let mut state = ProgressionState::default();

        // Exercise 1 of round 1 -> 20s exercise rest, exercise 2
        let (next, advance) = auto_navigate(&state, &station, 1);
        assert_eq!(
            advance,
            Advance::NextExercise {
                rest: Some(RestRequest {
                    seconds: 20,
                    context: RestContext::Exercise
                })
            }
        );
        assert_eq!(next.exercise_in_superset, 1);

        // Exercise 4 of round 1 -> 90s round rest, round 2 exercise 1
        state.exercise_in_superset = 3;
        let (next, advance) = auto_navigate(&state, &station, 1);
        assert_eq!(
            advance,
            Advance::NextRound {
                round: 2,
                rest: Some(RestRequest {
                    seconds: 90,
                    context: RestContext::Round
                })
            }
        );
        assert_eq!((next.exercise_in_superset, next.round), (0, 2));

        // Exercise 4 of round 3 -> next station, no rest
        state.round = 3;
        let (next, advance) = auto_navigate(&state, &station, 2);
        assert_eq!(advance, Advance::NextStation);
        assert_eq!(advance.rest(), None);
        assert_eq!(next, ProgressionState::at_station(1));

        // ... or finished when it was the last station
        let (next, advance) = auto_navigate(&state, &station, 1);
        assert_eq!(advance, Advance::Finished);
        assert_eq!(next, state);
    }

    #[test]
    fn test_triset_has_no_exercise_rest() {
        let exercises = (0..3).map(|i| exercise(&format!("t{}", i), 1, 0)).collect();
        let mut superset = Superset::new("T", SupersetKind::Triset, exercises, 2, Utc::now());
        superset.rest_between_exercises = 30;

        let (_, advance) =
            auto_navigate(&ProgressionState::default(), &Station::Superset(&superset), 1);
        assert_eq!(advance, Advance::NextExercise { rest: None });
    }

    #[test]
    fn test_standalone_sets_then_station() {
        let bench = exercise("bench", 3, 60);
        let station = Station::Exercise(&bench);

        let (next, advance) = auto_navigate(&ProgressionState::default(), &station, 2);
        assert_eq!(
            advance,
            Advance::NextSet {
                rest: Some(RestRequest {
                    seconds: 60,
                    context: RestContext::Set
                })
            }
        );
        assert_eq!(next.set_index, 1);

        let last = ProgressionState {
            set_index: 2,
            ..ProgressionState::default()
        };
        let (next, advance) = auto_navigate(&last, &station, 2);
        assert_eq!(advance, Advance::NextStation);
        assert_eq!(next, ProgressionState::at_station(1));
    }

    #[test]
    fn test_zero_rest_starts_no_timer() {
        let curl = exercise("curl", 2, 0);
        let (_, advance) =
            auto_navigate(&ProgressionState::default(), &Station::Exercise(&curl), 1);
        assert_eq!(advance, Advance::NextSet { rest: None });
    }

    #[test]
    fn test_validity_against_stations() {
        let bench = exercise("bench", 3, 60);
        let superset = circuit();
        let stations = vec![Station::Exercise(&bench), Station::Superset(&superset)];

        assert!(ProgressionState::default().is_valid_for(&stations));
        assert!(!ProgressionState::at_station(2).is_valid_for(&stations));

        let in_circuit = ProgressionState {
            station_index: 1,
            exercise_in_superset: 3,
            set_index: 0,
            round: 3,
        };
        assert!(in_circuit.is_valid_for(&stations));
        assert!(!ProgressionState { round: 4, ..in_circuit }.is_valid_for(&stations));
        assert!(!ProgressionState::default().is_valid_for(&[]));
    }
}
