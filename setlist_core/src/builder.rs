//! Superset and circuit assembly.
//!
//! A [`SupersetBuilder`] walks through the same steps a user does:
//! pick a kind, pick exercises (order is execution order), configure one
//! representative set per exercise, then name the group and set rounds and
//! rests. Every step validates against the kind's [`SupersetRules`]; nothing
//! reaches a plan until [`SupersetBuilder::build`] passes the full gate.

use crate::config::BuilderConfig;
use crate::{
    Exercise, ExerciseId, ExerciseType, Set, Superset, SupersetKind, SupersetRules,
    ValidationError,
};
use chrono::{DateTime, Local, Utc};

/// Per-round work target for one exercise
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetTarget {
    Reps(u32),
    /// Seconds
    Time(u32),
}

impl SetTarget {
    fn value(self) -> u32 {
        match self {
            SetTarget::Reps(v) | SetTarget::Time(v) => v,
        }
    }
}

#[derive(Clone, Debug)]
struct Selection {
    exercise: Exercise,
    target: SetTarget,
}

/// Step-wise, validating constructor for a [`Superset`]
#[derive(Clone, Debug)]
pub struct SupersetBuilder {
    kind: SupersetKind,
    selected: Vec<Selection>,
    use_time_for_all: bool,
    shared_time: u32,
    default_reps: u32,
    name: Option<String>,
    rounds: u32,
    max_rounds: Option<u32>,
    rest_between_rounds: u32,
    rest_between_exercises: u32,
}

impl SupersetBuilder {
    pub fn new(kind: SupersetKind) -> Self {
        Self::with_config(kind, &BuilderConfig::default())
    }

    pub fn with_config(kind: SupersetKind, config: &BuilderConfig) -> Self {
        let rules = kind.rules();
        Self {
            kind,
            selected: Vec::with_capacity(rules.max_exercises),
            use_time_for_all: false,
            shared_time: config.default_time_seconds,
            default_reps: config.default_reps,
            name: None,
            rounds: config.default_rounds,
            max_rounds: (config.max_rounds > 0).then_some(config.max_rounds),
            rest_between_rounds: config.default_round_rest_seconds,
            rest_between_exercises: if rules.has_exercise_rest {
                config.default_exercise_rest_seconds
            } else {
                0
            },
        }
    }

    pub fn kind(&self) -> SupersetKind {
        self.kind
    }

    pub fn rules(&self) -> SupersetRules {
        self.kind.rules()
    }

    /// Selected exercises in execution order
    pub fn selected(&self) -> impl Iterator<Item = &Exercise> {
        self.selected.iter().map(|s| &s.exercise)
    }

    pub fn target(&self, id: ExerciseId) -> Option<SetTarget> {
        self.selected
            .iter()
            .find(|s| s.exercise.id == id)
            .map(|s| s.target)
    }

    pub fn uses_time_for_all(&self) -> bool {
        self.use_time_for_all
    }

    // ------------------------------------------------------------------
    // Exercise selection
    // ------------------------------------------------------------------

    pub fn add_exercise(&mut self, exercise: Exercise) -> Result<(), ValidationError> {
        let rules = self.rules();
        if self.selected.iter().any(|s| s.exercise.id == exercise.id) {
            return Err(ValidationError::DuplicateExercise(exercise.name));
        }
        if self.selected.len() >= rules.max_exercises {
            return Err(ValidationError::TooManyExercises {
                kind: self.kind,
                max: rules.max_exercises,
            });
        }

        let target = self.initial_target(&exercise);
        self.selected.push(Selection { exercise, target });
        Ok(())
    }

    pub fn remove_exercise(&mut self, id: ExerciseId) -> Result<Exercise, ValidationError> {
        let index = self.position(id)?;
        Ok(self.selected.remove(index).exercise)
    }

    /// Gate between the selection step and the configuration step
    pub fn check_selection(&self) -> Result<(), ValidationError> {
        let rules = self.rules();
        let count = self.selected.len();
        if count < rules.min_exercises {
            return Err(ValidationError::TooFewExercises {
                kind: self.kind,
                min: rules.min_exercises,
                got: count,
            });
        }
        if count > rules.max_exercises {
            return Err(ValidationError::TooManyExercises {
                kind: self.kind,
                max: rules.max_exercises,
            });
        }
        Ok(())
    }

    fn initial_target(&self, exercise: &Exercise) -> SetTarget {
        if self.use_time_for_all {
            return SetTarget::Time(self.shared_time);
        }

        let first = exercise.sets.first();
        if exercise.exercise_type == ExerciseType::Time && self.rules().allow_timed_sets {
            let seconds = first.and_then(|s| s.duration).unwrap_or(self.shared_time);
            SetTarget::Time(seconds)
        } else {
            let reps = first.and_then(|s| s.reps).unwrap_or(self.default_reps);
            SetTarget::Reps(reps)
        }
    }

    fn position(&self, id: ExerciseId) -> Result<usize, ValidationError> {
        self.selected
            .iter()
            .position(|s| s.exercise.id == id)
            .ok_or(ValidationError::UnknownExercise(id))
    }

    // ------------------------------------------------------------------
    // Per-exercise configuration
    // ------------------------------------------------------------------

    /// Rejected while "time for all" holds every exercise in timed mode
    pub fn set_reps(&mut self, id: ExerciseId, reps: u32) -> Result<(), ValidationError> {
        if self.use_time_for_all {
            return Err(ValidationError::TimeForAllActive);
        }
        let index = self.position(id)?;
        self.selected[index].target = SetTarget::Reps(reps);
        Ok(())
    }

    pub fn set_time(&mut self, id: ExerciseId, seconds: u32) -> Result<(), ValidationError> {
        if !self.rules().allow_timed_sets {
            return Err(ValidationError::TimedSetsNotAllowed(self.kind));
        }
        let index = self.position(id)?;
        self.selected[index].target = SetTarget::Time(seconds);
        Ok(())
    }

    /// Force every exercise into timed mode sharing one duration, or put
    /// them all back on the default rep target
    pub fn set_use_time_for_all(&mut self, enabled: bool) -> Result<(), ValidationError> {
        if enabled && !self.rules().allow_timed_sets {
            return Err(ValidationError::TimedSetsNotAllowed(self.kind));
        }

        self.use_time_for_all = enabled;
        let target = if enabled {
            SetTarget::Time(self.shared_time)
        } else {
            SetTarget::Reps(self.default_reps)
        };
        for selection in &mut self.selected {
            selection.target = target;
        }
        Ok(())
    }

    /// Shared duration used by "time for all"; mirrored into every exercise
    /// while that mode is on
    pub fn set_shared_time(&mut self, seconds: u32) {
        self.shared_time = seconds;
        if self.use_time_for_all {
            for selection in &mut self.selected {
                selection.target = SetTarget::Time(seconds);
            }
        }
    }

    // ------------------------------------------------------------------
    // Final configuration
    // ------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn set_rounds(&mut self, rounds: u32) {
        self.rounds = rounds;
    }

    pub fn set_rest_between_rounds(&mut self, seconds: u32) {
        self.rest_between_rounds = seconds;
    }

    /// Only kinds with inter-exercise rest accept a non-zero value
    pub fn set_rest_between_exercises(&mut self, seconds: u32) -> Result<(), ValidationError> {
        if seconds > 0 && !self.rules().has_exercise_rest {
            return Err(ValidationError::ExerciseRestNotAllowed(self.kind));
        }
        self.rest_between_exercises = seconds;
        Ok(())
    }

    /// `"{Kind} {HH:MM}"` at the given time
    pub fn default_name(&self, now: DateTime<Local>) -> String {
        format!("{} {}", self.kind.display_name(), now.format("%H:%M"))
    }

    /// The full gate checked before creation
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.check_selection()?;

        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName);
            }
        }

        if self.rounds == 0 {
            return Err(ValidationError::ZeroRounds);
        }
        if let Some(max) = self.max_rounds {
            if self.rounds > max {
                return Err(ValidationError::TooManyRounds(max));
            }
        }

        if let Some(bad) = self.selected.iter().find(|s| s.target.value() == 0) {
            return Err(ValidationError::NonPositiveTarget(bad.exercise.name.clone()));
        }

        Ok(())
    }

    /// Produce the configured superset. Does not touch any plan; see
    /// [`crate::WorkoutPlan::create_superset`].
    pub fn build(&self, now: DateTime<Local>) -> Result<Superset, ValidationError> {
        self.validate()?;

        let exercises = self
            .selected
            .iter()
            .map(|selection| {
                let mut exercise = selection.exercise.clone();
                let weight = exercise.sets.first().and_then(|s| s.weight);
                let mut set = match selection.target {
                    SetTarget::Reps(reps) => {
                        exercise.exercise_type = ExerciseType::Repetitions;
                        Set::with_reps(reps)
                    }
                    SetTarget::Time(seconds) => {
                        exercise.exercise_type = ExerciseType::Time;
                        Set::timed(seconds)
                    }
                };
                set.weight = weight;
                exercise.sets = vec![set];
                exercise
            })
            .collect();

        let name = match self.name {
            Some(ref name) => name.trim().to_string(),
            None => self.default_name(now),
        };

        let mut superset = Superset::new(
            name,
            self.kind,
            exercises,
            self.rounds,
            now.with_timezone(&Utc),
        );
        superset.rest_between_rounds = self.rest_between_rounds;
        if self.rules().has_exercise_rest {
            superset.rest_between_exercises = self.rest_between_exercises;
        }

        tracing::debug!(
            "Built {} '{}' ({} rounds)",
            superset.kind,
            superset.name,
            superset.total_rounds()
        );
        Ok(superset)
    }
}
