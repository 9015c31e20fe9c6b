//! Error types for the setlist_core library.

use crate::SupersetKind;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for setlist_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A user action was blocked at the boundary
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Rejections raised by builder gates and session guards.
///
/// None of these leave partial state behind: the action that produced
/// them simply did not happen.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{kind} needs at least {min} exercises, got {got}")]
    TooFewExercises {
        kind: SupersetKind,
        min: usize,
        got: usize,
    },

    #[error("{kind} allows at most {max} exercises")]
    TooManyExercises { kind: SupersetKind, max: usize },

    #[error("exercise '{0}' is already selected")]
    DuplicateExercise(String),

    #[error("no exercise with id {0} in this selection")]
    UnknownExercise(uuid::Uuid),

    #[error("{0} does not allow timed sets")]
    TimedSetsNotAllowed(SupersetKind),

    #[error("rep targets are disabled while time for all is on")]
    TimeForAllActive,

    #[error("{0} does not allow rest between exercises")]
    ExerciseRestNotAllowed(SupersetKind),

    #[error("name must not be empty")]
    EmptyName,

    #[error("rounds must be greater than zero")]
    ZeroRounds,

    #[error("rounds must not exceed {0}")]
    TooManyRounds(u32),

    #[error("target for '{0}' must be greater than zero")]
    NonPositiveTarget(String),

    #[error("RPE must be between 1 and 10, got {0}")]
    RpeOutOfRange(u8),

    #[error("no active station")]
    NoActiveStation,

    #[error("current set is missing a positive {0}")]
    IncompleteSet(crate::ExerciseType),

    #[error("an advance is already pending")]
    AdvancePending,

    #[error("the workout has already finished")]
    WorkoutFinished,

    #[error("no exercise timer is running")]
    TimerNotRunning,
}
