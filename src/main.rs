use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

mod aggregate;
mod api;
mod cleaner;
mod columns;
mod config;
mod db;
mod error;
mod forecast;
mod importer;
mod logging;
mod models;
mod parser;
mod reconcile;
mod report;
mod rows;
mod stats;
mod store;

use crate::api::ApiResponse;
use crate::config::Config;
use crate::db::PgStore;
use crate::models::SimulationStep;
use crate::store::AttendanceStore;

#[derive(Parser)]
#[command(name = "attendance-forecast")]
#[command(about = "Attendance report parser, importer and what-if forecaster", long_about = None)]
struct Cli {
    /// Postgres connection string for commands that use the store
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Parse an attendance report export without storing it
    Parse {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import per-session attendance logs for a user
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        user: String,
    },
    /// Show a user's stored attendance by session count
    Dashboard {
        #[arg(long)]
        user: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Project percentages under hypothetical attend/skip decisions
    #[command(group(
        ArgGroup::new("baseline")
            .args(["user", "report"])
            .required(true)
            .multiple(false)
    ))]
    Forecast {
        /// JSON array of {subject_id, action, weight}
        #[arg(long)]
        steps: PathBuf,
        #[arg(long)]
        user: Option<String>,
        /// Attendance report export to forecast from instead of the store
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_steps(path: &Path) -> anyhow::Result<Vec<SimulationStep>> {
    let bytes = read_input(path)?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a JSON array of forecast steps", path.display()))
}

fn emit(response: ApiResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    if !response.is_success() {
        anyhow::bail!("request failed with status {}", response.status);
    }
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<PgStore> {
    let pool = db::connect(config)
        .await
        .context("failed to connect to Postgres")?;
    Ok(PgStore::new(pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().with_database_url(cli.database_url);
    logging::init_tracing(&config.log_level);

    match cli.command {
        Commands::InitDb => {
            let pool = db::connect(&config)
                .await
                .context("failed to connect to Postgres")?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Parse { csv } => {
            let bytes = read_input(&csv)?;
            emit(api::upload(Some(bytes.as_slice())))?;
        }
        Commands::Import { csv, user } => {
            let bytes = read_input(&csv)?;
            let store = open_store(&config).await?;
            emit(api::import(&store, Some(user.as_str()), Some(bytes.as_slice())).await)?;
        }
        Commands::Dashboard { user, format } => {
            let store = open_store(&config).await?;
            match format {
                OutputFormat::Json => emit(api::dashboard(&store, Some(user.as_str())).await)?,
                OutputFormat::Markdown => {
                    let subjects = store.subject_logs(&user).await?;
                    let report = stats::dashboard_report(&subjects);
                    print!("{}", report::build_report(&user, &report));
                }
            }
        }
        Commands::Forecast {
            steps,
            user,
            report,
        } => {
            let steps = load_steps(&steps)?;
            let response = match (user, report) {
                (_, Some(path)) => {
                    let bytes = read_input(&path)?;
                    api::forecast_upload(Some(bytes.as_slice()), &steps)
                }
                (user, None) => {
                    let store = open_store(&config).await?;
                    api::forecast(&store, user.as_deref(), &steps).await
                }
            };
            emit(response)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_needs_exactly_one_baseline() {
        let parsed = Cli::try_parse_from(["attendance-forecast", "forecast", "--steps", "s.json"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "attendance-forecast",
            "forecast",
            "--steps",
            "s.json",
            "--user",
            "avery",
            "--report",
            "r.csv",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "attendance-forecast",
            "forecast",
            "--steps",
            "s.json",
            "--report",
            "r.csv",
        ]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn steps_are_loaded_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"subject_id": "Physics", "action": "attend"}}, {{"subject_id": "Maths", "weight": 3}}]"#
        )
        .unwrap();

        let steps = load_steps(file.path()).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].action, models::Action::Attend);
        assert_eq!(steps[1].action, models::Action::Skip);
        assert_eq!(steps[1].weight, rust_decimal::Decimal::from(3));
    }

    #[test]
    fn malformed_steps_are_reported_with_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_steps(file.path()).unwrap_err();
        assert!(err.to_string().contains("is not a JSON array of forecast steps"));
    }

    #[test]
    fn missing_input_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        let err = read_input(&path).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }
}
