use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tasting_panel::config::{self, Config};
use tasting_panel::ledger::{self, CsvLedger, ScoreRecord, SubmissionStore};
use tasting_panel::output;
use tasting_panel::rate::{run_rating_session, Prompter, SessionEnd};
use tasting_panel::scoring::Rubric;
use tasting_panel::{App, SubmitError};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_PERSISTENCE: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_VALIDATION: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default panel config (five rib sets, five categories)
    Init {
        /// Overwrite an existing config without asking
        #[arg(long)]
        force: bool,
    },
    /// Score every sample as NAME and submit the sheet
    Rate {
        /// Rater name shown in results
        name: String,
    },
    /// Show rankings and the category breakdown (default if no subcommand)
    Results {
        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Show every rater's individual scores
    Submissions,
    /// Write all submissions to a JSON file
    Export {
        path: PathBuf,
    },
    /// Add submissions from a JSON export, skipping ones already stored
    Import {
        path: PathBuf,
    },
    /// Delete every submission
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "tasting-panel")]
#[command(about = "Blind tasting scores: collect, average and rank", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/tasting-panel/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the CSV ledger (overrides the config file)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let cli = Cli::parse();
    tasting_panel::logging::init(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Results { tsv: false });
    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init { force } = command {
        std::process::exit(run_init(config_path, force));
    }

    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate the panel once; everything downstream relies on fixed axes
    let rubric = match Rubric::from_config(&config) {
        Ok(r) => Arc::new(r),
        Err(errors) => {
            eprintln!("Config errors:");
            for error in errors {
                eprintln!("  - {}", error);
            }
            std::process::exit(EXIT_CONFIG);
        }
    };

    let ledger_path = config::resolve_ledger_path(&config, cli.ledger);
    tracing::debug!(ledger = %ledger_path.display(), "using CSV ledger");

    let mut store = SubmissionStore::with_ledger(
        Arc::clone(&rubric),
        Box::new(CsvLedger::new(&ledger_path, Arc::clone(&rubric))),
    );
    if let Err(e) = store.load() {
        eprintln!("Warning: could not read ledger: {}", e);
    }
    let mut app = App::new(rubric, store);

    let code = match command {
        Commands::Init { .. } => EXIT_SUCCESS,
        Commands::Rate { name } => run_rate(&mut app, &name, &ledger_path),
        Commands::Results { tsv } => run_results(&app, tsv),
        Commands::Submissions => run_submissions(&app),
        Commands::Export { path } => run_export(&app, &path),
        Commands::Import { path } => run_import(&mut app, &path),
        Commands::Clear { yes } => run_clear(&mut app, yes),
    };

    std::process::exit(code);
}

fn stdin_prompter() -> Prompter<io::StdinLock<'static>, io::Stdout> {
    Prompter::new(io::stdin().lock(), io::stdout())
}

fn submit_exit_code(e: &SubmitError) -> i32 {
    match e {
        SubmitError::Validation(_) | SubmitError::Incomplete(_) => EXIT_VALIDATION,
        SubmitError::Persistence(_) => EXIT_PERSISTENCE,
    }
}

fn run_init(config_path: Option<PathBuf>, force: bool) -> i32 {
    let path = config_path.unwrap_or_else(config::get_config_path);

    if path.exists() && !force {
        let mut io = stdin_prompter();
        let overwrite = io
            .ask_yes_no(
                &format!("Config already exists at {}. Overwrite?", path.display()),
                false,
            )
            .unwrap_or(false);
        if !overwrite {
            println!("Keeping existing config.");
            return EXIT_SUCCESS;
        }
    }

    match config::save_config(&path, &Config::default()) {
        Ok(()) => {
            println!("Config written to {}", path.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to write config: {:#}", e);
            EXIT_CONFIG
        }
    }
}

fn run_rate(app: &mut App, name: &str, ledger_path: &Path) -> i32 {
    if name.trim().is_empty() {
        eprintln!("Rater name cannot be empty.");
        return EXIT_VALIDATION;
    }

    let (existing, _) = app.snapshot_or_memory();
    if !existing.is_empty() {
        println!("{}", output::format_participation(existing.len()));
    }

    let mut draft = app.start_draft();
    let mut io = stdin_prompter();
    let end = match run_rating_session(&mut io, name, &mut draft) {
        Ok(end) => end,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    if end == SessionEnd::Quit {
        println!("Scores not submitted.");
        return EXIT_SUCCESS;
    }

    match app.submit(name, &mut draft) {
        Ok(_) => {
            println!("Scores submitted successfully!");
            println!();
            run_results(app, false)
        }
        Err(SubmitError::Persistence(e)) => {
            eprintln!("Could not save to ledger: {}", e);
            retry_or_rescue(app, &mut io, ledger_path)
        }
        Err(e) => {
            eprintln!("Submission rejected: {}", e);
            submit_exit_code(&e)
        }
    }
}

/// The record only lives in memory now. Offer retries, then write it to a
/// rescue export so it survives the process.
fn retry_or_rescue(
    app: &mut App,
    io: &mut Prompter<io::StdinLock<'static>, io::Stdout>,
    ledger_path: &Path,
) -> i32 {
    while app.store().is_unsynced() && io.ask_yes_no("Retry saving?", true).unwrap_or(false) {
        if let Err(e) = app.sync() {
            eprintln!("Still failing: {}", e);
        }
    }
    if !app.store().is_unsynced() {
        println!("Scores submitted successfully!");
        return EXIT_SUCCESS;
    }

    // Earlier rescues may still be waiting for import; add to them
    let rescue = ledger_path.with_extension("unsaved.json");
    let records: Vec<ScoreRecord> = app.store().snapshot();
    match ledger::merge_into_export(&rescue, app.rubric(), &records) {
        Ok(total) => eprintln!(
            "{} unsaved submissions held in {}. Run `tasting-panel import {}` once the ledger is back.",
            total,
            rescue.display(),
            rescue.display()
        ),
        Err(e) => eprintln!("Failed to write rescue file: {:#}", e),
    }
    EXIT_PERSISTENCE
}

fn run_results(app: &App, tsv: bool) -> i32 {
    let results = app.results();
    if results.stale {
        eprintln!("Warning: ledger unreadable, showing this session's submissions only.");
    }

    if tsv {
        println!(
            "{}",
            output::format_tsv(&results.ranking, &results.aggregate)
        );
        return EXIT_SUCCESS;
    }

    if results.aggregate.submissions == 0 {
        println!("No submissions yet! Be the first to rate.");
        return EXIT_SUCCESS;
    }

    let use_colors = output::should_use_colors();
    let rubric = app.rubric();

    println!(
        "{}",
        output::format_submission_count(results.aggregate.submissions)
    );
    println!();
    println!("Overall Rankings");
    println!(
        "{}",
        output::format_rankings(&results.ranking, rubric.max_total(), use_colors)
    );
    println!();
    println!("Category Breakdown");
    println!(
        "{}",
        output::format_breakdown(rubric, &results.aggregate, use_colors)
    );

    EXIT_SUCCESS
}

fn run_submissions(app: &App) -> i32 {
    let (records, stale) = app.snapshot_or_memory();
    if stale {
        eprintln!("Warning: ledger unreadable, showing this session's submissions only.");
    }
    println!(
        "{}",
        output::format_submissions(app.rubric(), &records, output::should_use_colors())
    );
    EXIT_SUCCESS
}

fn run_export(app: &App, path: &Path) -> i32 {
    let (records, stale) = app.snapshot_or_memory();
    if stale {
        eprintln!("Ledger unreadable, refusing to export a partial snapshot.");
        return EXIT_PERSISTENCE;
    }

    match ledger::write_export(path, app.rubric(), &records) {
        Ok(()) => {
            println!("Exported {} submissions to {}", records.len(), path.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Export failed: {:#}", e);
            EXIT_FAILURE
        }
    }
}

fn run_import(app: &mut App, path: &Path) -> i32 {
    let records = match ledger::read_export(path, app.rubric()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Import failed: {:#}", e);
            return EXIT_VALIDATION;
        }
    };

    let mut added = 0;
    let mut skipped = 0;
    for record in records {
        match app.add_record(record) {
            Ok(true) => added += 1,
            Ok(false) => skipped += 1,
            Err(e) => {
                eprintln!("Import stopped after {} records: {}", added, e);
                return submit_exit_code(&e);
            }
        }
    }

    println!("Imported {} submissions ({} already present)", added, skipped);
    EXIT_SUCCESS
}

fn run_clear(app: &mut App, yes: bool) -> i32 {
    if !yes {
        let (records, _) = app.snapshot_or_memory();
        let mut io = stdin_prompter();
        let confirmed = io
            .ask_yes_no(
                &format!(
                    "Delete all {} submissions? This cannot be undone.",
                    records.len()
                ),
                false,
            )
            .unwrap_or(false);
        if !confirmed {
            println!("Aborted.");
            return EXIT_SUCCESS;
        }
    }

    match app.clear_all() {
        Ok(()) => {
            println!("All submissions deleted.");
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to clear ledger: {}", e);
            EXIT_PERSISTENCE
        }
    }
}
