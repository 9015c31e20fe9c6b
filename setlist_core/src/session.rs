//! Live workout session.
//!
//! A [`Session`] owns the plan, the progression position and the timers,
//! and is the single mutation path while a workout is in progress. Every
//! change is reported to a [`SessionObserver`], which is how a UI, a store
//! or a navigation layer hears about it.
//!
//! Invalid input never raises: a blocked action returns a rejection, emits
//! [`Feedback::Rejected`] and leaves all state untouched.

use crate::builder::SupersetBuilder;
use crate::plan::{PendingDeletion, WorkoutPlan};
use crate::progress::{session_progress, SessionProgress};
use crate::progression::{auto_navigate, completes_round, Advance, ProgressionState};
use crate::sequencer::{Station, StationKey};
use crate::timer::{Clock, RestContext, SystemClock, TimerCoordinator};
use crate::{
    Exercise, ExerciseId, ExerciseType, SessionPayload, Set, SetField, Superset, SupersetId,
    ValidationError,
};
use chrono::Local;
use std::time::{Duration, Instant};

/// Haptic-style cues
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// An action was blocked
    Rejected,
    SetCompleted,
    /// A rest interval ran out
    RestComplete,
}

/// Callbacks fired by a [`Session`]. Every method defaults to a no-op.
pub trait SessionObserver {
    /// The standalone exercise list changed
    fn on_update_exercises(&mut self, _exercises: &[Exercise]) {}

    /// The superset at `index` (creation order) changed
    fn on_update_superset(&mut self, _index: usize, _superset: &Superset) {}

    fn on_start_rest_timer(&mut self, _seconds: u32, _context: RestContext) {}

    /// A rest ended, either naturally or by cancellation
    fn on_rest_finished(&mut self, _context: RestContext, _cancelled: bool) {}

    fn on_feedback(&mut self, _feedback: Feedback) {}

    /// Auto-navigation ran past the last station
    fn on_workout_finished(&mut self) {}

    /// The user finalized the session
    fn on_complete_workout(&mut self, _payload: &SessionPayload) {}

    fn on_close(&mut self) {}
}

/// Observer that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Result of [`Session::complete_current_set`]
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionOutcome {
    Rejected(ValidationError),
    /// `advance` is `None` while the post-completion delay is running
    Completed { advance: Option<Advance> },
}

impl CompletionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CompletionOutcome::Completed { .. })
    }
}

/// Something that happened during [`Session::poll`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Advanced(Advance),
    RestFinished(RestContext),
}

/// Where the current set lives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SetAddress {
    station: StationKey,
    exercise: usize,
    set: usize,
}

pub struct Session<C: Clock = SystemClock> {
    plan: WorkoutPlan,
    state: ProgressionState,
    timers: TimerCoordinator,
    clock: C,
    observer: Box<dyn SessionObserver>,
    advance_delay: Duration,
    pending_advance: Option<Instant>,
    finished: bool,
    /// Set the running exercise timer measures
    timed_set: Option<SetAddress>,
}

impl<C: Clock> Session<C> {
    /// Open a session at the first station
    pub fn new(plan: WorkoutPlan, clock: C, observer: Box<dyn SessionObserver>) -> Self {
        tracing::info!("Opened session with {} stations", plan.stations().len());
        Self {
            plan,
            state: ProgressionState::default(),
            timers: TimerCoordinator::new(),
            clock,
            observer,
            advance_delay: Duration::ZERO,
            pending_advance: None,
            finished: false,
            timed_set: None,
        }
    }

    /// Delay between a completed set and the automatic move
    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    /// Resume at a saved position, falling back to the first station if it
    /// no longer fits the plan
    pub fn with_state(mut self, state: ProgressionState) -> Self {
        if state.is_valid_for(&self.plan.stations()) {
            self.state = state;
        } else {
            tracing::warn!("Saved position {:?} does not fit the plan, starting over", state);
            self.state = ProgressionState::default();
        }
        self
    }

    /// Start the traversal over, as when the session view is reopened
    pub fn reopen(&mut self) {
        self.state = ProgressionState::default();
        self.pending_advance = None;
        self.finished = false;
        self.timers = TimerCoordinator::new();
        self.timed_set = None;
        tracing::info!("Session reopened");
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    pub fn state(&self) -> ProgressionState {
        self.state
    }

    pub fn timers(&self) -> &TimerCoordinator {
        &self.timers
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn stations(&self) -> Vec<Station<'_>> {
        self.plan.stations()
    }

    pub fn current_station(&self) -> Option<Station<'_>> {
        self.plan.stations().get(self.state.station_index).copied()
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        match self.current_station()? {
            Station::Exercise(e) => Some(e),
            Station::Superset(s) => s.exercises.get(self.state.exercise_in_superset),
        }
    }

    pub fn current_set(&self) -> Option<&Set> {
        let exercise = self.current_exercise()?;
        let index = match self.current_station()? {
            Station::Exercise(_) => self.state.set_index,
            Station::Superset(_) => 0,
        };
        exercise.sets.get(index)
    }

    pub fn has_pending_advance(&self) -> bool {
        self.pending_advance.is_some()
    }

    /// Auto-navigation reached the end of the plan
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn progress(&self) -> SessionProgress {
        session_progress(self.plan.exercises(), self.plan.supersets())
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Mark the current set done and move on.
    ///
    /// With a zero delay the move is applied before returning; otherwise it
    /// is applied by [`Session::poll`] once the delay has elapsed.
    pub fn complete_current_set(&mut self) -> CompletionOutcome {
        if self.finished {
            return self.reject(ValidationError::WorkoutFinished);
        }
        if self.pending_advance.is_some() {
            return self.reject(ValidationError::AdvancePending);
        }
        let Some(address) = self.current_address() else {
            return self.reject(ValidationError::NoActiveStation);
        };

        let index = self.state.exercise_in_superset;
        let round = self.state.round;
        let closes_round = match address.station {
            StationKey::Superset(id) => self
                .plan
                .superset(id)
                .is_some_and(|s| completes_round(&self.state, s)),
            StationKey::Exercise(_) => false,
        };

        let Some((set, kind)) = self.set_mut(address) else {
            return self.reject(ValidationError::NoActiveStation);
        };
        if !set.is_complete(kind) {
            return self.reject(ValidationError::IncompleteSet(kind));
        }
        set.completed = true;

        if let StationKey::Superset(id) = address.station {
            if closes_round {
                if let Some(superset) = self.plan.superset_mut(id) {
                    superset.mark_round_completed(round);
                }
            }
            tracing::debug!("Completed exercise {} of round {}", index + 1, round);
        } else {
            tracing::debug!("Completed set {}", address.set + 1);
        }
        self.notify(address.station);
        self.observer.on_feedback(Feedback::SetCompleted);

        if self.advance_delay.is_zero() {
            let advance = self.apply_advance();
            CompletionOutcome::Completed {
                advance: Some(advance),
            }
        } else {
            self.pending_advance = Some(self.clock.now() + self.advance_delay);
            CompletionOutcome::Completed { advance: None }
        }
    }

    /// Apply a delayed move right away
    pub fn flush_pending_advance(&mut self) -> Option<Advance> {
        self.pending_advance.take()?;
        Some(self.apply_advance())
    }

    /// Apply due moves and expire finished rests
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();

        if self.pending_advance.is_some_and(|due| now >= due) {
            self.pending_advance = None;
            events.push(SessionEvent::Advanced(self.apply_advance()));
        }

        if let Some(context) = self.timers.poll_rest(now) {
            self.observer.on_feedback(Feedback::RestComplete);
            self.observer.on_rest_finished(context, false);
            events.push(SessionEvent::RestFinished(context));
        }

        events
    }

    fn apply_advance(&mut self) -> Advance {
        self.abandon_exercise_timer();
        let (next, advance, superset) = {
            let stations = self.plan.stations();
            let Some(station) = stations.get(self.state.station_index) else {
                return Advance::Finished;
            };
            let (next, advance) = auto_navigate(&self.state, station, stations.len());
            let superset = match station {
                Station::Superset(s) => Some(s.id),
                Station::Exercise(_) => None,
            };
            (next, advance, superset)
        };
        self.state = next;

        if let (Advance::NextRound { round, .. }, Some(id)) = (advance, superset) {
            if let Some(superset) = self.plan.superset_mut(id) {
                superset.set_current_round(round);
            }
            self.notify(StationKey::Superset(id));
        }

        if let Some(rest) = advance.rest() {
            self.timers
                .start_rest(rest.seconds, rest.context, self.clock.now());
            self.observer.on_start_rest_timer(rest.seconds, rest.context);
        }

        if advance == Advance::Finished {
            self.finished = true;
            tracing::info!("Workout traversal finished");
            self.observer.on_workout_finished();
        } else {
            tracing::debug!("Advanced: {:?} -> {:?}", advance, self.state);
        }
        advance
    }

    // ------------------------------------------------------------------
    // Field edits and manual navigation
    // ------------------------------------------------------------------

    /// Write one field of the set under the cursor
    pub fn update_current_set(&mut self, field: SetField) -> Result<(), ValidationError> {
        let address = self.current_address().ok_or(ValidationError::NoActiveStation)?;
        let (set, _) = self
            .set_mut(address)
            .ok_or(ValidationError::NoActiveStation)?;
        set.apply(field);
        self.notify(address.station);
        Ok(())
    }

    pub fn navigate_to_previous_station(&mut self) -> bool {
        if self.state.station_index == 0 {
            return false;
        }
        self.jump_to(self.state.station_index - 1);
        true
    }

    pub fn navigate_to_next_station(&mut self) -> bool {
        if self.state.station_index + 1 >= self.plan.stations().len() {
            return false;
        }
        self.jump_to(self.state.station_index + 1);
        true
    }

    /// Manual moves always start the target station from the top
    fn jump_to(&mut self, station_index: usize) {
        self.state = ProgressionState::at_station(station_index);
        self.pending_advance = None;
        self.finished = false;
        self.abandon_exercise_timer();
        tracing::debug!("Moved to station {}", station_index);
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    pub fn pause_rest(&mut self) {
        self.timers.pause_rest(self.clock.now());
    }

    pub fn resume_rest(&mut self) {
        self.timers.resume_rest(self.clock.now());
    }

    /// Skip the rest. Progression is unaffected.
    pub fn cancel_rest(&mut self) -> Option<RestContext> {
        let context = self.timers.cancel_rest()?;
        self.observer.on_rest_finished(context, true);
        Some(context)
    }

    /// Start timing the current set
    pub fn start_exercise_timer(&mut self) -> Result<(), ValidationError> {
        if self.finished {
            return Err(ValidationError::WorkoutFinished);
        }
        let address = self.current_address().ok_or(ValidationError::NoActiveStation)?;
        let exercise = self.current_exercise().ok_or(ValidationError::NoActiveStation)?;
        let target = match exercise.exercise_type {
            ExerciseType::Time => self.current_set().and_then(|s| s.duration),
            _ => None,
        };
        self.timers.start_exercise(target, self.clock.now());
        self.timed_set = Some(address);
        Ok(())
    }

    pub fn pause_exercise_timer(&mut self) {
        self.timers.pause_exercise(self.clock.now());
    }

    pub fn resume_exercise_timer(&mut self) {
        self.timers.resume_exercise(self.clock.now());
    }

    /// Drop the measurement without touching the set
    pub fn cancel_exercise_timer(&mut self) -> bool {
        self.timed_set = None;
        self.timers.cancel_exercise()
    }

    /// Stop the timer, record the measured seconds on the current set and
    /// complete it
    pub fn finish_exercise_timer(&mut self) -> CompletionOutcome {
        let Some(address) = self.current_address() else {
            return self.reject(ValidationError::NoActiveStation);
        };
        if self.pending_advance.is_some() {
            return self.reject(ValidationError::AdvancePending);
        }
        if self.timers.exercise().is_none() || self.timed_set != Some(address) {
            self.abandon_exercise_timer();
            return self.reject(ValidationError::TimerNotRunning);
        }
        self.timed_set = None;
        let Some(seconds) = self.timers.finish_exercise(self.clock.now()) else {
            return self.reject(ValidationError::TimerNotRunning);
        };

        if let Some((set, kind)) = self.set_mut(address) {
            set.actual_duration = Some(seconds);
            // Open-ended timed sets take the measurement as their duration
            if kind == ExerciseType::Time && set.duration.is_none() {
                set.duration = Some(seconds);
            }
        }
        tracing::debug!("Exercise timer stopped at {}s", seconds);
        self.complete_current_set()
    }

    // ------------------------------------------------------------------
    // Plan edits
    // ------------------------------------------------------------------

    pub fn add_exercise(&mut self, exercise: Exercise) {
        let anchor = self.current_key();
        self.plan.add_exercise(exercise);
        self.reanchor(anchor);
        self.observer.on_update_exercises(self.plan.exercises());
    }

    /// Create a superset from the builder's selection in one step
    pub fn create_superset(
        &mut self,
        builder: &SupersetBuilder,
    ) -> Result<SupersetId, ValidationError> {
        let anchor = self.current_key();
        let id = match self.plan.create_superset(builder, Local::now()) {
            Ok(id) => id,
            Err(e) => {
                self.observer.on_feedback(Feedback::Rejected);
                return Err(e);
            }
        };
        self.reanchor(anchor);
        self.observer.on_update_exercises(self.plan.exercises());
        self.notify(StationKey::Superset(id));
        Ok(id)
    }

    pub fn request_delete_exercise(&self, id: ExerciseId) -> Option<PendingDeletion> {
        self.plan.request_delete_exercise(id)
    }

    pub fn request_delete_superset(&self, id: SupersetId) -> Option<PendingDeletion> {
        self.plan.request_delete_superset(id)
    }

    /// Apply a deletion the user has confirmed
    pub fn confirm_deletion(&mut self, pending: &PendingDeletion) -> bool {
        let anchor = self.current_key();
        if !self.plan.confirm_deletion(pending) {
            return false;
        }
        self.reanchor(anchor);
        self.observer.on_update_exercises(self.plan.exercises());
        true
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Finalize the session and hand its payload to the observer
    pub fn complete_workout(&mut self) -> SessionPayload {
        let payload = self.plan.to_payload();
        tracing::info!(
            "Workout completed at {:.0}%",
            self.progress().percent()
        );
        self.observer.on_complete_workout(&payload);
        payload
    }

    /// Dismiss the session view and give the plan back
    pub fn close(mut self) -> WorkoutPlan {
        self.timers = TimerCoordinator::new();
        self.observer.on_close();
        self.plan
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn reject(&mut self, reason: ValidationError) -> CompletionOutcome {
        tracing::debug!("Rejected: {}", reason);
        self.observer.on_feedback(Feedback::Rejected);
        CompletionOutcome::Rejected(reason)
    }

    /// A measurement only belongs to the set it was started on
    fn abandon_exercise_timer(&mut self) {
        self.timed_set = None;
        if self.timers.cancel_exercise() {
            tracing::debug!("Discarded exercise timer for a set that is no longer current");
        }
    }

    fn current_key(&self) -> Option<StationKey> {
        self.current_station().map(|s| s.key())
    }

    fn current_address(&self) -> Option<SetAddress> {
        let station = self.current_station()?;
        let (exercise, set) = match station {
            Station::Exercise(_) => (0, self.state.set_index),
            Station::Superset(_) => (self.state.exercise_in_superset, 0),
        };
        Some(SetAddress {
            station: station.key(),
            exercise,
            set,
        })
    }

    fn set_mut(&mut self, address: SetAddress) -> Option<(&mut Set, ExerciseType)> {
        let exercise = match address.station {
            StationKey::Exercise(id) => self.plan.exercise_mut(id)?,
            StationKey::Superset(id) => self
                .plan
                .superset_mut(id)?
                .exercises
                .get_mut(address.exercise)?,
        };
        let kind = exercise.exercise_type;
        exercise.sets.get_mut(address.set).map(|set| (set, kind))
    }

    fn notify(&mut self, key: StationKey) {
        match key {
            StationKey::Exercise(_) => self.observer.on_update_exercises(self.plan.exercises()),
            StationKey::Superset(id) => {
                if let Some(index) = self.plan.superset_index(id) {
                    self.observer
                        .on_update_superset(index, &self.plan.supersets()[index]);
                }
            }
        }
    }

    /// Keep the cursor on the same station after a plan edit, or fall back
    /// to the first station if it no longer exists
    fn reanchor(&mut self, anchor: Option<StationKey>) {
        let found = anchor.and_then(|key| {
            self.plan
                .stations()
                .iter()
                .position(|station| station.key() == key)
        });

        match found {
            Some(index) => self.state.station_index = index,
            None => {
                if anchor.is_some() {
                    tracing::info!("Active station was removed, resetting position");
                }
                self.state = ProgressionState::default();
                self.pending_advance = None;
                self.finished = false;
                self.abandon_exercise_timer();
            }
        }
    }
}
