use clap::{Parser, Subcommand, ValueEnum};
use setlist_core::catalog::BuiltinCatalog;
use setlist_core::history::find_last_by_sport;
use setlist_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const STORE_FILE: &str = "workouts.jsonl";
const CSV_FILE: &str = "workouts.csv";
const SNAPSHOT_FILE: &str = "session.json";

#[derive(Parser)]
#[command(name = "setlist")]
#[command(about = "Workout station progression engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog exercises
    Catalog {
        /// Filter by name, muscle group or equipment
        #[arg(long)]
        search: Option<String>,
    },

    /// Print a sample session payload as JSON
    Sample {
        /// Build a single grouping of this kind instead of the mixed plan
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Show the stations of a session payload
    Plan {
        /// Session payload (JSON)
        file: PathBuf,
    },

    /// Walk through a session payload set by set
    Run {
        /// Session payload (JSON)
        #[arg(required_unless_present = "resume")]
        file: Option<PathBuf>,

        /// Resume the session saved by an earlier quit
        #[arg(long, conflicts_with = "file")]
        resume: bool,

        /// Auto-complete (for testing) - complete every set and skip rests
        #[arg(long)]
        auto_complete: bool,

        /// Workout name
        #[arg(long, default_value = "Workout")]
        name: String,

        /// Sport label stored with the workout
        #[arg(long, default_value = "strength")]
        sport: String,

        /// Rate of perceived exertion (1-10)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        rpe: Option<u8>,
    },

    /// List recent workouts
    History {
        /// Trailing window in days
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Roll up the workout store to CSV
    Rollup {
        /// Clean up processed store files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Superset,
    Triset,
    Circuit,
    Megacircuit,
}

impl From<KindArg> for SupersetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Superset => SupersetKind::Superset,
            KindArg::Triset => SupersetKind::Triset,
            KindArg::Circuit => SupersetKind::Circuit,
            KindArg::Megacircuit => SupersetKind::Megacircuit,
        }
    }
}

struct RunOptions {
    file: Option<PathBuf>,
    resume: bool,
    auto_complete: bool,
    name: String,
    sport: String,
    rpe: Option<u8>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setlist_core::logging::init_with_level(setlist_core::logging::level_for_verbosity(cli.verbose));

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Commands::Catalog { search } => cmd_catalog(search.as_deref()),
        Commands::Sample { kind } => cmd_sample(kind.map(SupersetKind::from), &config),
        Commands::Plan { file } => cmd_plan(&file),
        Commands::Run {
            file,
            resume,
            auto_complete,
            name,
            sport,
            rpe,
        } => cmd_run(
            &data_dir,
            RunOptions {
                file,
                resume,
                auto_complete,
                name,
                sport,
                rpe,
            },
            &config,
        ),
        Commands::History { days } => cmd_history(&data_dir, days),
        Commands::Rollup { cleanup } => cmd_rollup(&data_dir, cleanup),
    }
}

fn checked_catalog() -> Result<&'static BuiltinCatalog> {
    let catalog = default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Other("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn cmd_catalog(search: Option<&str>) -> Result<()> {
    let catalog = checked_catalog()?;
    let entries = catalog.search(search.unwrap_or(""));

    if entries.is_empty() {
        println!("No exercises match.");
        return Ok(());
    }

    for info in entries {
        println!(
            "{:<18} {:<20} {:<16} {:<14} {}",
            info.id, info.name, info.muscle_group, info.equipment, info.exercise_type
        );
    }
    Ok(())
}

fn catalog_exercise(
    catalog: &BuiltinCatalog,
    id: &str,
    sets: usize,
    template: Set,
    config: &Config,
) -> Result<Exercise> {
    let info = catalog
        .get(id)
        .ok_or_else(|| Error::Other(format!("Catalog has no exercise '{}'", id)))?;
    Ok(info.instantiate(sets, template, config.session.default_rest_seconds))
}

fn cmd_sample(kind: Option<SupersetKind>, config: &Config) -> Result<()> {
    let catalog = checked_catalog()?;
    let mut plan = WorkoutPlan::new();

    let kind = match kind {
        Some(kind) => kind,
        None => {
            let bench = catalog_exercise(catalog, "bench_press", 3, Set::with_reps(8), config)?;
            let plank = catalog_exercise(catalog, "plank", 2, Set::timed(45), config)?;
            plan.add_exercise(bench);
            plan.add_exercise(plank);
            SupersetKind::Superset
        }
    };

    // Enough members to satisfy the kind's minimum, skipping distance work
    let members: Vec<&ExerciseInfo> = catalog
        .entries()
        .iter()
        .filter(|e| e.exercise_type != ExerciseType::Distance)
        .filter(|e| !plan.exercises().iter().any(|x| x.catalog_id == e.id))
        .filter(|e| kind.rules().allow_timed_sets || e.exercise_type == ExerciseType::Repetitions)
        .take(kind.rules().min_exercises.max(4).min(kind.rules().max_exercises))
        .collect();

    let mut builder = SupersetBuilder::with_config(kind, &config.builder);
    for info in members {
        builder.add_exercise(info.instantiate(1, Set::with_reps(config.builder.default_reps), 0))?;
    }
    plan.create_superset(&builder, chrono::Local::now())?;

    let json = serde_json::to_string_pretty(&plan.to_payload())?;
    println!("{}", json);
    Ok(())
}

fn load_payload(path: &Path) -> Result<SessionPayload> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn describe_station(station: &Station<'_>) -> String {
    match station {
        Station::Exercise(e) => format!("{} ({} sets, {})", e.name, e.sets.len(), e.exercise_type),
        Station::Superset(s) => format!(
            "{} [{}] ({} exercises x {} rounds)",
            s.name,
            s.kind,
            s.exercises.len(),
            s.total_rounds()
        ),
    }
}

fn cmd_plan(file: &Path) -> Result<()> {
    let plan = WorkoutPlan::from_payload(load_payload(file)?);
    let stations = plan.stations();

    if stations.is_empty() {
        println!("Plan is empty.");
        return Ok(());
    }

    for (i, station) in stations.iter().enumerate() {
        println!("{:>2}. {}", i + 1, describe_station(station));
        if let Station::Superset(s) = station {
            for exercise in &s.exercises {
                println!("      - {}", exercise.name);
            }
        }
    }

    let progress = setlist_core::progress::session_progress(plan.exercises(), plan.supersets());
    println!();
    println!(
        "Progress: {:.1}% ({}/{} sets)",
        progress.percent(),
        progress.completed_sets,
        progress.total_sets
    );
    Ok(())
}

/// Prints session callbacks as they happen
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_start_rest_timer(&mut self, seconds: u32, context: RestContext) {
        println!("  Rest {}s ({})", seconds, context);
    }

    fn on_rest_finished(&mut self, context: RestContext, cancelled: bool) {
        if cancelled {
            println!("  {} rest skipped", context);
        } else {
            println!("  {} rest complete", context);
        }
    }

    fn on_workout_finished(&mut self) {
        println!("\n✓ All stations complete!");
    }
}

enum UserAction {
    Complete,
    Timed,
    Reps(u32),
    Weight(f64),
    Next,
    Previous,
    Quit,
}

fn prompt_user_action() -> Result<UserAction> {
    loop {
        println!("  Enter = done, 't' = time it, 'r N' = reps, 'w KG' = weight,");
        println!("  'n' / 'p' = next / previous station, 'q' = save and quit");
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Ok(UserAction::Quit);
        }

        let mut parts = input.split_whitespace();
        let action = match (parts.next(), parts.next()) {
            (None, _) => Some(UserAction::Complete),
            (Some("t"), None) => Some(UserAction::Timed),
            (Some("n"), None) => Some(UserAction::Next),
            (Some("p"), None) => Some(UserAction::Previous),
            (Some("q"), None) => Some(UserAction::Quit),
            (Some("r"), Some(v)) => v.parse().ok().map(UserAction::Reps),
            (Some("w"), Some(v)) => v.parse().ok().map(UserAction::Weight),
            _ => None,
        };

        match action {
            Some(action) => return Ok(action),
            None => println!("Unrecognized input: {}", input.trim()),
        }
    }
}

fn wait_for_enter() -> Result<()> {
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(())
}

fn display_position(session: &Session) {
    let Some(station) = session.current_station() else {
        return;
    };
    let state = session.state();
    let progress = session.progress();

    println!("\n╭─────────────────────────────────────────╮");
    println!(
        "│  Station {}/{}: {}",
        state.station_index + 1,
        session.stations().len(),
        station.name()
    );
    println!("╰─────────────────────────────────────────╯");

    if let Some(exercise) = session.current_exercise() {
        match station {
            Station::Superset(s) => println!(
                "  {} (exercise {}/{}, round {}/{})",
                exercise.name,
                state.exercise_in_superset + 1,
                s.exercises.len(),
                state.round,
                s.total_rounds()
            ),
            Station::Exercise(e) => println!(
                "  {} (set {}/{})",
                exercise.name,
                state.set_index + 1,
                e.sets.len()
            ),
        }
    }

    if let Some(set) = session.current_set() {
        let mut target = Vec::new();
        if let Some(reps) = set.reps {
            target.push(format!("{} reps", reps));
        }
        if let Some(duration) = set.duration {
            target.push(format!("{}s", duration));
        }
        if let Some(distance) = set.distance {
            target.push(format!("{} m", distance));
        }
        if let Some(weight) = set.weight {
            target.push(format!("@ {} kg", weight));
        }
        if !target.is_empty() {
            println!("  → {}", target.join(" "));
        }
    }

    println!("  Progress: {:.0}%", progress.percent());
}

fn report(outcome: &CompletionOutcome) {
    if let CompletionOutcome::Rejected(reason) = outcome {
        println!("  ✗ {}", reason);
    }
}

fn cmd_run(data_dir: &Path, opts: RunOptions, config: &Config) -> Result<()> {
    let store_path = data_dir.join(STORE_FILE);
    let snapshot_path = data_dir.join(SNAPSHOT_FILE);
    std::fs::create_dir_all(data_dir)?;

    let (workout_id, name, payload, position) = if opts.resume {
        let snapshot = SessionSnapshot::load(&snapshot_path)?
            .ok_or_else(|| Error::State("No saved session to resume".into()))?;
        println!("Resuming '{}'", snapshot.name);
        (snapshot.workout_id, snapshot.name, snapshot.session, Some(snapshot.progression))
    } else {
        let file = opts
            .file
            .as_deref()
            .ok_or_else(|| Error::Other("A session payload file is required".into()))?;
        (Uuid::new_v4(), opts.name.clone(), load_payload(file)?, None)
    };

    if let Ok(recent) = load_recent_workouts(&store_path, 30, chrono::Utc::now()) {
        if let Some(last) = find_last_by_sport(&recent, &opts.sport) {
            println!("Last {} workout: {} on {}", last.sport, last.name, last.date);
        }
    }

    let delay = if opts.auto_complete {
        std::time::Duration::ZERO
    } else {
        config.session.advance_delay()
    };
    let mut session = Session::new(
        WorkoutPlan::from_payload(payload),
        SystemClock,
        Box::new(ConsoleObserver),
    )
    .with_advance_delay(delay);
    if let Some(position) = position {
        session = session.with_state(position);
    }

    let skip_rests = opts.auto_complete || config.session.auto_cancel_rest;
    let mut quit = false;

    while !session.is_finished() {
        if session.current_station().is_none() {
            println!("Nothing to do: the plan has no stations.");
            break;
        }
        display_position(&session);

        let action = if opts.auto_complete {
            UserAction::Complete
        } else {
            prompt_user_action()?
        };

        // Report rests that ran out at the prompt, then end any still running
        session.poll();
        session.cancel_rest();

        match action {
            UserAction::Complete => {
                let outcome = session.complete_current_set();
                report(&outcome);
                if !outcome.is_completed()
                    && opts.auto_complete
                    && !session.navigate_to_next_station()
                {
                    break;
                }
            }
            UserAction::Timed => match session.start_exercise_timer() {
                Ok(()) => {
                    println!("  Timer running, press Enter to stop");
                    wait_for_enter()?;
                    report(&session.finish_exercise_timer());
                }
                Err(e) => println!("  ✗ {}", e),
            },
            UserAction::Reps(reps) => {
                if let Err(e) = session.update_current_set(SetField::Reps(Some(reps))) {
                    println!("  ✗ {}", e);
                }
            }
            UserAction::Weight(kg) => {
                if let Err(e) = session.update_current_set(SetField::Weight(Some(kg))) {
                    println!("  ✗ {}", e);
                }
            }
            UserAction::Next => {
                if !session.navigate_to_next_station() {
                    println!("  Already at the last station");
                }
            }
            UserAction::Previous => {
                if !session.navigate_to_previous_station() {
                    println!("  Already at the first station");
                }
            }
            UserAction::Quit => {
                quit = true;
                break;
            }
        }

        if session.has_pending_advance() {
            std::thread::sleep(delay);
            session.flush_pending_advance();
        }
        if skip_rests {
            session.cancel_rest();
        }
        session.poll();
    }

    let now = chrono::Utc::now();
    let payload = session.plan().to_payload();
    let mut workout = Workout::new(name.clone(), opts.sport.clone(), payload, now);
    workout.id = workout_id;
    let mut store = JsonlWorkoutStore::new(&store_path);

    if quit {
        let snapshot = SessionSnapshot {
            workout_id,
            name,
            session: workout.session.clone(),
            progression: session.state(),
            saved_at: now,
        };
        snapshot.save(&snapshot_path)?;
        session.close();
        save_workout(&mut store, &mut workout, opts.resume, now)?;
        println!("\nSession saved. Resume with `setlist run --resume`.");
        return Ok(());
    }

    workout.session = session.complete_workout();
    let post = opts.rpe.map(|rpe| PostWorkoutData {
        rpe,
        feeling: String::new(),
        notes: String::new(),
        timestamp: now,
    });
    workout.complete(post, now)?;
    session.close();

    save_workout(&mut store, &mut workout, opts.resume, now)?;
    SessionSnapshot::clear(&snapshot_path)?;

    let progress = setlist_core::progress::session_progress(
        &workout.session.exercises,
        &workout.session.supersets,
    );
    println!(
        "\n✓ Workout logged! {:.1}% ({}/{} sets)",
        progress.percent(),
        progress.completed_sets,
        progress.total_sets
    );
    Ok(())
}

/// A resumed workout already has an open version in the store, unless a
/// rollup archived it in between
fn save_workout(
    store: &mut JsonlWorkoutStore,
    workout: &mut Workout,
    resumed: bool,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    if resumed {
        match store.append_version(workout, now) {
            Err(Error::State(reason)) => {
                tracing::info!("{}; appending as a new record", reason);
            }
            other => return other,
        }
    }
    store.append(workout)
}

fn cmd_history(data_dir: &Path, days: i64) -> Result<()> {
    let store_path = data_dir.join(STORE_FILE);
    let workouts = load_recent_workouts(&store_path, days, chrono::Utc::now())?;

    if workouts.is_empty() {
        println!("No workouts in the last {} days.", days);
        return Ok(());
    }

    for workout in &workouts {
        let pct = calculate_progress(&workout.session.exercises, &workout.session.supersets);
        let status = if workout.completed { "done" } else { "open" };
        let rpe = workout
            .post_workout_data
            .as_ref()
            .map(|p| format!("  RPE {}", p.rpe))
            .unwrap_or_default();
        println!(
            "{}  {:<20} {:<10} {:>5.1}%  {}{}",
            workout.date, workout.name, workout.sport, pct, status, rpe
        );
    }
    Ok(())
}

fn cmd_rollup(data_dir: &Path, cleanup: bool) -> Result<()> {
    let store_path = data_dir.join(STORE_FILE);
    let csv_path = data_dir.join(CSV_FILE);

    if !store_path.exists() {
        println!("No workout store found - nothing to roll up.");
        return Ok(());
    }

    let count = setlist_core::rollup::rollup_to_csv(&store_path, &csv_path)?;

    println!("✓ Rolled up {} workouts to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = setlist_core::rollup::cleanup_processed(data_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed store files", cleaned);
        }
    }

    Ok(())
}
