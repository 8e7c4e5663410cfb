use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use lift_core::catalog::decode_custom_exercises;
use lift_core::credentials::credential_from_deep_link;
use lift_core::decode::decode_history_json;
use lift_core::nutrition::{explanation_segments, Segment};
use lift_core::series::chart_labels;
use lift_core::vision::mime_type_for;
use lift_core::workout::parse_exercise_arg;
use lift_core::*;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nlw")]
#[command(about = "Weights-room workout log and meal nutrition estimator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.config/nlw/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with the deep link from the web sign-in page
    Login {
        /// Link of the form nlw://login?user=<percent-encoded profile>
        link: String,
    },

    /// Forget the stored credential
    Logout,

    /// Show weight progression for one category
    Dashboard {
        /// Category to chart (Chest, Arms, Back, Legs, Abs, or a custom one)
        #[arg(long)]
        category: Option<String>,

        /// Read workout history from a JSON file instead of the server
        #[arg(long)]
        history_file: Option<PathBuf>,

        /// Read custom exercises from a JSON file instead of the server
        #[arg(long)]
        exercises_file: Option<PathBuf>,

        /// Print series as CSV
        #[arg(long, conflicts_with = "json")]
        csv: bool,

        /// Print series as JSON
        #[arg(long)]
        json: bool,
    },

    /// List exercise categories
    Categories {
        /// Read custom exercises from a JSON file instead of the server
        #[arg(long)]
        exercises_file: Option<PathBuf>,
    },

    /// Log a workout
    Log {
        /// NAME=WEIGHTxREPS,... (repeatable), e.g. Bis=20x12,22.5x10
        #[arg(long = "exercise", short = 'e', required = true)]
        exercises: Vec<String>,

        /// Workout date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Save without finishing; the workout stays in progress
        #[arg(long)]
        draft: bool,

        /// Add to today's in-progress workout instead of starting a new one
        #[arg(long, conflicts_with = "date")]
        resume: bool,

        /// Print the request body without sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Add a custom exercise to a category
    AddExercise {
        #[arg(long)]
        name: String,

        #[arg(long)]
        category: String,
    },

    /// Photograph analysis: estimate nutrition facts for a meal photo
    Analyze {
        image: PathBuf,

        /// Also print the model's explanation
        #[arg(long)]
        explain: bool,
    },

    /// Read nutrition facts from a saved model response
    Nutrition {
        response_file: PathBuf,

        /// Also print the explanation
        #[arg(long)]
        explain: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    lift_core::logging::init_with_level(lift_core::logging::level_for_verbosity(cli.verbose));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(hint) = hint_for(&e) {
                eprintln!("  {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Where to find the config; read only by commands that need it.
struct ConfigArgs {
    path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<Config> {
        let mut config = match &self.path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(dir) = &self.data_dir {
            config.data.data_dir = dir.clone();
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ConfigArgs {
        path: cli.config,
        data_dir: cli.data_dir,
    };

    match cli.command {
        Commands::Login { link } => cmd_login(&config.load()?, &link),
        Commands::Logout => cmd_logout(&config.load()?),
        Commands::Dashboard {
            category,
            history_file,
            exercises_file,
            csv,
            json,
        } => cmd_dashboard(
            &config.load()?,
            category,
            history_file.as_deref(),
            exercises_file.as_deref(),
            OutputFormat::from_flags(csv, json),
        ),
        Commands::Categories { exercises_file } => {
            cmd_categories(&config.load()?, exercises_file.as_deref())
        }
        Commands::Log {
            exercises,
            date,
            draft,
            resume,
            dry_run,
        } => cmd_log(&config.load()?, &exercises, date, draft, resume, dry_run),
        Commands::AddExercise { name, category } => {
            cmd_add_exercise(&config.load()?, name, category)
        }
        Commands::Analyze { image, explain } => cmd_analyze(&config.load()?, &image, explain),
        Commands::Nutrition {
            response_file,
            explain,
        } => cmd_nutrition(&response_file, explain),
    }
}

/// Follow-up advice for errors the user can act on
fn hint_for(error: &Error) -> Option<&'static str> {
    match error {
        Error::Parse(_) => {
            Some("Could not read nutrition data. Please try again with another photo.")
        }
        Error::Credentials(_) => Some("Sign in again with `nlw login <link>`."),
        Error::Http(_) => Some("Check the server URL in your config and your connection."),
        _ => None,
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn credential_store(config: &Config) -> FileCredentialStore {
    FileCredentialStore::new(config.data.credential_path())
}

/// Email of the signed-in user, or a credentials error
fn signed_in_email(config: &Config) -> Result<String> {
    let credential = credential_store(config)
        .load()?
        .ok_or_else(|| Error::Credentials("not signed in".into()))?;
    Ok(credential.primary_email()?.to_string())
}

fn cmd_login(config: &Config, link: &str) -> Result<()> {
    let credential = credential_from_deep_link(link)?
        .ok_or_else(|| Error::Credentials("link has no user parameter".into()))?;
    credential_store(config).save(&credential)?;
    println!("✓ Signed in as {}", credential.primary_email()?);
    Ok(())
}

fn cmd_logout(config: &Config) -> Result<()> {
    credential_store(config).clear()?;
    println!("✓ Signed out");
    Ok(())
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

impl OutputFormat {
    fn from_flags(csv: bool, json: bool) -> Self {
        match (csv, json) {
            (true, _) => OutputFormat::Csv,
            (_, true) => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Build the dashboard from files where given, the server otherwise.
fn load_dashboard(
    config: &Config,
    history_file: Option<&Path>,
    exercises_file: Option<&Path>,
) -> Result<Dashboard> {
    let mut dashboard = Dashboard::new(config.dashboard.default_category.as_deref());

    if let (None, None) = (history_file, exercises_file) {
        let email = signed_in_email(config)?;
        let backend = BackendClient::new(&config.server)?;
        dashboard.refresh(&backend, &backend, &email)?;
        return Ok(dashboard);
    }

    if let Some(path) = history_file {
        let body = std::fs::read_to_string(path)?;
        dashboard.set_records(decode_history_json(&body)?);
    }
    if let Some(path) = exercises_file {
        let body = std::fs::read_to_string(path)?;
        dashboard.merge_custom(&decode_custom_exercises(&body)?);
    }
    Ok(dashboard)
}

fn cmd_dashboard(
    config: &Config,
    category: Option<String>,
    history_file: Option<&Path>,
    exercises_file: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut dashboard = load_dashboard(config, history_file, exercises_file)?;
    if let Some(name) = category.as_deref() {
        dashboard.select_category(name)?;
    }

    let series = dashboard.graph_data();
    let selected = dashboard.selected_category().unwrap_or_default();
    let in_progress = dashboard.in_progress(today());

    match format {
        OutputFormat::Csv => {
            lift_core::export::write_series_csv(io::stdout().lock(), &series)?;
        }
        OutputFormat::Json => {
            let labels: serde_json::Map<String, serde_json::Value> = series
                .iter()
                .map(|(name, s)| {
                    (
                        name.to_string(),
                        serde_json::json!(chart_labels(
                            &s.dates,
                            config.dashboard.max_chart_labels
                        )),
                    )
                })
                .collect();
            let out = serde_json::json!({
                "category": selected,
                "inProgress": in_progress.is_some(),
                "series": series,
                "labels": labels,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            display_dashboard(
                selected,
                dashboard.categories(),
                &series,
                in_progress.is_some(),
                config.dashboard.max_chart_labels,
            );
        }
    }
    Ok(())
}

fn cmd_categories(config: &Config, exercises_file: Option<&Path>) -> Result<()> {
    let mut categories = get_default_categories().clone();
    match exercises_file {
        Some(path) => {
            let body = std::fs::read_to_string(path)?;
            categories.merge_custom(&decode_custom_exercises(&body)?);
        }
        None => {
            let email = signed_in_email(config)?;
            let backend = BackendClient::new(&config.server)?;
            categories.merge_custom(&backend.fetch_custom_exercises(&email)?);
        }
    }

    let errors = categories.validate();
    for error in &errors {
        tracing::warn!("Category problem: {}", error);
    }

    for category in &categories.categories {
        println!("{}: {}", category.name, category.exercises.join(", "));
    }
    Ok(())
}

fn cmd_log(
    config: &Config,
    exercise_args: &[String],
    date: Option<NaiveDate>,
    draft: bool,
    resume: bool,
    dry_run: bool,
) -> Result<()> {
    let entries = exercise_args
        .iter()
        .map(|arg| parse_exercise_arg(arg))
        .collect::<Result<Vec<_>>>()?;

    let mut workout = if resume {
        let email = signed_in_email(config)?;
        let backend = BackendClient::new(&config.server)?;
        let records = backend.fetch_history(&email)?;
        match lift_core::series::find_in_progress(&records, today()) {
            Some(record) => {
                println!("Continuing today's in-progress workout");
                WorkoutSubmission::from_record(record)
            }
            None => {
                println!("No in-progress workout today, starting a new one");
                WorkoutSubmission::new(today())
            }
        }
    } else {
        WorkoutSubmission::new(date.unwrap_or_else(today))
    };

    for entry in entries {
        workout.add_exercise(entry);
    }
    workout.submitted = !draft;
    workout.validate()?;

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&workout)?);
        println!("\n[Dry run - not sending workout]");
        return Ok(());
    }

    let email = signed_in_email(config)?;
    let backend = BackendClient::new(&config.server)?;
    let message = backend.log_workout(&email, &workout)?;

    if draft {
        println!("✓ Workout saved as in progress for {}", workout.date);
    } else {
        println!("✓ Workout logged for {}", workout.date);
    }
    if let Some(message) = message {
        println!("  {}", message);
    }
    Ok(())
}

fn cmd_add_exercise(config: &Config, name: String, category: String) -> Result<()> {
    let email = signed_in_email(config)?;
    let backend = BackendClient::new(&config.server)?;
    let exercise = CustomExercise { name, category };
    backend.add_exercise(&email, &exercise)?;
    println!("✓ Added {} to {}", exercise.name, exercise.category);
    Ok(())
}

fn cmd_analyze(config: &Config, image: &Path, explain: bool) -> Result<()> {
    let mime_type = mime_type_for(image)?;
    let bytes = std::fs::read(image)?;
    let vision = OpenAiVision::new(&config.vision)?;

    println!("Analyzing {}...", image.display());
    let analysis = analyze_meal(&vision, &bytes, mime_type)?;
    display_analysis(&analysis, explain);
    Ok(())
}

fn cmd_nutrition(response_file: &Path, explain: bool) -> Result<()> {
    let text = std::fs::read_to_string(response_file)?;
    let analysis = parse_nutrition(&text)?;
    display_analysis(&analysis, explain);
    Ok(())
}

// ============================================================================
// Display
// ============================================================================

const SPARK_TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One character per value, scaled between the series min and max.
fn sparkline(values: &[f64]) -> String {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARK_TICKS[SPARK_TICKS.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARK_TICKS.len() - 1) as f64).round() as usize;
                SPARK_TICKS[idx.min(SPARK_TICKS.len() - 1)]
            }
        })
        .collect()
}

fn display_dashboard(
    selected: &str,
    categories: &Categories,
    series: &SeriesMap,
    in_progress: bool,
    max_labels: usize,
) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  DASHBOARD: {}", selected);
    println!("╰─────────────────────────────────────────╯");

    if in_progress {
        println!("\n  You have an in-progress workout for today.");
        println!("  Continue it with `nlw log --resume -e NAME=WEIGHTxREPS`.");
    }

    let others: Vec<&str> = categories.names().filter(|n| *n != selected).collect();
    if !others.is_empty() {
        println!("\n  Other categories: {}", others.join(", "));
    }

    if series.is_empty() {
        println!("\n  No workouts logged for {} yet.", selected);
        return;
    }

    for (exercise, s) in series.iter() {
        println!("\n  {}", exercise);
        println!("    max {}", sparkline(&s.max_weights));
        println!("    avg {}", sparkline(&s.avg_weights));

        let labels = chart_labels(&s.dates, max_labels);
        println!("    {:<8} {:>8} {:>8}", "date", "max", "avg");
        for i in 0..s.len() {
            let label = if labels[i].is_empty() {
                "·"
            } else {
                labels[i].as_str()
            };
            println!(
                "    {:<8} {:>8.2} {:>8.2}",
                label, s.max_weights[i], s.avg_weights[i]
            );
        }
    }
    println!();
}

fn display_analysis(analysis: &NutritionAnalysis, explain: bool) {
    println!("\n{}", analysis.facts);
    println!("\n*Percent Daily Values are based on a 2,000 calorie diet.");

    if !explain {
        return;
    }

    let bold = io::stdout().is_terminal();
    println!("\n─────────────────────────────────────────");
    for segment in explanation_segments(&analysis.explanation) {
        match segment {
            Segment::Plain(text) => print!("{}", text),
            Segment::Bold(text) if bold => print!("\x1b[1m{}\x1b[0m", text),
            Segment::Bold(text) => print!("{}", text),
            Segment::Code(text) => {
                for line in text.trim().lines() {
                    print!("\n    {}", line);
                }
                println!();
            }
        }
    }
    println!();
}
