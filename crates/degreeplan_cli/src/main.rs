//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `degreeplan_core` linkage without the Flutter runtime.
//! - Seed a catalog from JSON and print a stored plan for local checks.
//!
//! Usage:
//! - `degreeplan`: print ping and version.
//! - `degreeplan import <catalog.json>`: validate and store a catalog.
//! - `degreeplan show <user_id> <start_year>`: print the stored plan.

use clap::{Parser, Subcommand};
use degreeplan_core::db::open_db;
use degreeplan_core::{
    init_logging_from_config, persist_channel, Catalog, PlanSessionService, PlannerConfig,
    SqliteAssignmentRepository, SqliteCourseRepository,
};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Degree planner local checks", long_about = None)]
struct Cli {
    /// Database file, overrides DEGREEPLAN_DB_PATH
    #[arg(long)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Validates a catalog JSON file and stores its courses
    Import { path: PathBuf },
    /// Prints the stored plan of one user
    Show { user_id: Uuid, start_year: i32 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    println!("degreeplan_core ping={}", degreeplan_core::ping());
    println!("degreeplan_core version={}", degreeplan_core::core_version());

    let Some(command) = cli.command else {
        return ExitCode::SUCCESS;
    };
    match run(cli.db, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db: Option<PathBuf>, command: Command) -> Result<(), String> {
    let mut config = PlannerConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(db_path) = db {
        config.db_path = db_path;
    }
    init_logging_from_config(&config)?;

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let service = PlanSessionService::new(
        SqliteCourseRepository::try_new(&conn).map_err(|err| err.to_string())?,
        SqliteAssignmentRepository::try_new(&conn).map_err(|err| err.to_string())?,
    );

    match command {
        Command::Import { path } => {
            let payload = std::fs::read_to_string(&path)
                .map_err(|err| format!("cannot read `{}`: {err}", path.display()))?;
            let catalog = Catalog::from_json_str(&payload).map_err(|err| err.to_string())?;
            let imported = service
                .import_catalog(catalog.courses().to_vec())
                .map_err(|err| err.to_string())?;
            println!(
                "imported {imported} course(s) into {}",
                config.db_path.display()
            );
        }
        Command::Show {
            user_id,
            start_year,
        } => {
            // No gestures run, so nothing is ever enqueued.
            let (queue, _receiver) = persist_channel();
            let engine = service
                .open_session(user_id, start_year, queue, config.target_units)
                .map_err(|err| err.to_string())?;

            for semester in engine.plan().semesters() {
                let members: Vec<&str> = semester.members.iter().map(|id| id.as_str()).collect();
                println!(
                    "{:>2} {:<12} {}",
                    semester.index,
                    semester.label(),
                    members.join(", ")
                );
            }
            let summary = engine.summary();
            println!(
                "units {}/{} complete={} unassigned={}",
                summary.total_units,
                summary.target_units,
                summary.is_complete,
                engine.unassigned().len()
            );
        }
    }
    Ok(())
}
