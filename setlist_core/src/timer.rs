//! Rest and exercise timers.
//!
//! Timers never count down by ticking. They store the instant they were
//! (re)started plus the time accumulated before the last pause, and derive
//! elapsed or remaining time from the clock when asked. That keeps them
//! correct across suspension, e.g. an app sitting in the background.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic time
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Reads `Instant::now()`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for tests and simulations. Clones share one timeline.
#[derive(Clone, Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

/// What a rest interval follows
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RestContext {
    /// Between sets of a standalone exercise
    Set,
    /// Between exercises inside a superset round
    Exercise,
    /// Between superset rounds
    Round,
}

impl fmt::Display for RestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestContext::Set => write!(f, "set"),
            RestContext::Exercise => write!(f, "exercise"),
            RestContext::Round => write!(f, "round"),
        }
    }
}

/// Pausable elapsed-time accumulator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    pub fn started(now: Instant) -> Self {
        Self {
            started_at: Some(now),
            accumulated: Duration::ZERO,
        }
    }

    /// `now - started_at + accumulated`
    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();
        self.accumulated + running
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(start) = self.started_at.take() {
            self.accumulated += now.saturating_duration_since(start);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }
}

/// Countdown between units of work
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestTimer {
    pub context: RestContext,
    pub duration: Duration,
    watch: Stopwatch,
}

impl RestTimer {
    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.watch.elapsed(now))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    pub fn is_paused(&self) -> bool {
        !self.watch.is_running()
    }
}

/// Stopwatch for a timed set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExerciseTimer {
    /// Planned duration, if the set has one
    pub target: Option<Duration>,
    watch: Stopwatch,
}

impl ExerciseTimer {
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.watch.elapsed(now)
    }

    /// Time left against the target; `None` for open-ended timers
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.target.map(|t| t.saturating_sub(self.elapsed(now)))
    }

    pub fn is_paused(&self) -> bool {
        !self.watch.is_running()
    }
}

/// Owns the one rest timer and the one exercise timer of a session
#[derive(Clone, Debug, Default)]
pub struct TimerCoordinator {
    rest: Option<RestTimer>,
    exercise: Option<ExerciseTimer>,
}

impl TimerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rest(&self) -> Option<&RestTimer> {
        self.rest.as_ref()
    }

    pub fn exercise(&self) -> Option<&ExerciseTimer> {
        self.exercise.as_ref()
    }

    /// Start a rest interval, replacing any running one
    pub fn start_rest(&mut self, seconds: u32, context: RestContext, now: Instant) {
        if let Some(previous) = self.rest.replace(RestTimer {
            context,
            duration: Duration::from_secs(u64::from(seconds)),
            watch: Stopwatch::started(now),
        }) {
            tracing::debug!("Replaced unfinished {} rest", previous.context);
        }
        tracing::debug!("Started {}s {} rest", seconds, context);
    }

    pub fn pause_rest(&mut self, now: Instant) {
        if let Some(rest) = self.rest.as_mut() {
            rest.watch.pause(now);
        }
    }

    pub fn resume_rest(&mut self, now: Instant) {
        if let Some(rest) = self.rest.as_mut() {
            rest.watch.resume(now);
        }
    }

    /// Dismiss the rest early
    pub fn cancel_rest(&mut self) -> Option<RestContext> {
        self.rest.take().map(|rest| rest.context)
    }

    /// Clear and report a rest that has run out
    pub fn poll_rest(&mut self, now: Instant) -> Option<RestContext> {
        let finished = self.rest.filter(|rest| rest.is_finished(now))?;
        self.rest = None;
        Some(finished.context)
    }

    pub fn start_exercise(&mut self, target_seconds: Option<u32>, now: Instant) {
        self.exercise = Some(ExerciseTimer {
            target: target_seconds.map(|s| Duration::from_secs(u64::from(s))),
            watch: Stopwatch::started(now),
        });
    }

    pub fn pause_exercise(&mut self, now: Instant) {
        if let Some(timer) = self.exercise.as_mut() {
            timer.watch.pause(now);
        }
    }

    pub fn resume_exercise(&mut self, now: Instant) {
        if let Some(timer) = self.exercise.as_mut() {
            timer.watch.resume(now);
        }
    }

    /// Stop the exercise timer and report whole elapsed seconds
    pub fn finish_exercise(&mut self, now: Instant) -> Option<u32> {
        self.exercise.take().map(|timer| {
            let secs = timer.elapsed(now).as_secs_f64().round();
            secs.min(f64::from(u32::MAX)) as u32
        })
    }

    /// Drop the measurement
    pub fn cancel_exercise(&mut self) -> bool {
        self.exercise.take().is_some()
    }
}
