#![forbid(unsafe_code)]

//! Workout progression engine for setlist.
//!
//! This crate provides:
//! - Domain types (sets, exercises, supersets, workout records)
//! - Superset/circuit builder with per-kind validation
//! - Station sequencing and the progression state machine
//! - Rest and exercise timers driven by a pluggable clock
//! - Progress calculation
//! - Persistence adapters (workout store, CSV rollup, session snapshot)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod builder;
pub mod sequencer;
pub mod plan;
pub mod progression;
pub mod timer;
pub mod progress;
pub mod session;
pub mod store;
pub mod history;
pub mod rollup;
pub mod snapshot;

// Re-export commonly used types
pub use error::{Error, Result, ValidationError};
pub use types::*;
pub use catalog::{default_catalog, ExerciseCatalog, ExerciseInfo};
pub use config::Config;
pub use builder::{SetTarget, SupersetBuilder};
pub use sequencer::{build_stations, Station, StationKey};
pub use plan::{PendingDeletion, WorkoutPlan};
pub use progression::{Advance, ProgressionState, RestRequest};
pub use timer::{Clock, ManualClock, RestContext, SystemClock, TimerCoordinator};
pub use progress::{calculate_progress, is_set_complete, is_superset_complete, superset_progress};
pub use session::{
    CompletionOutcome, Feedback, NoopObserver, Session, SessionEvent, SessionObserver,
};
pub use store::{load_workouts, JsonlWorkoutStore, WorkoutSink};
pub use history::load_recent_workouts;
pub use snapshot::SessionSnapshot;
