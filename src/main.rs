use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use feedback_analytics::dashboard::{self, DashboardOptions};
use feedback_analytics::models::Snapshot;
use feedback_analytics::{scan_ratings, FeedbackScope};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod db;
mod export;

use config::Config;

#[derive(Parser)]
#[command(name = "feedback-analytics")]
#[command(about = "Course and lecturer feedback analytics for the university dashboard", long_about = None)]
struct Cli {
    /// Config file (defaults to ./feedback-analytics.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Postgres connection string; overrides `[database] url` in the config file
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// Read entities from a JSON snapshot instead of Postgres
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Reference date for monthly windows (YYYY-MM-DD, defaults to today in UTC)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DashboardFormat {
    Markdown,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum TableFormat {
    Table,
    Csv,
}

#[derive(clap::Args, Clone)]
struct ScopeArgs {
    /// Only feedback for offerings in this semester
    #[arg(long, conflicts_with = "current_semester")]
    semester: Option<Uuid>,

    /// Only feedback for offerings in the current semester
    #[arg(long)]
    current_semester: bool,

    /// Only feedback for courses in this department
    #[arg(long)]
    department: Option<Uuid>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample departments, courses and feedback
    Seed,
    /// Build the full dashboard payload
    Dashboard {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, value_enum, default_value_t = DashboardFormat::Markdown)]
        format: DashboardFormat,
        /// Trend length in months
        #[arg(long)]
        months_back: Option<usize>,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rank lecturers by average rating
    Lecturers {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long, value_enum, default_value_t = TableFormat::Table)]
        format: TableFormat,
    },
    /// Rank courses by average rating
    Courses {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long, value_enum, default_value_t = TableFormat::Table)]
        format: TableFormat,
    },
    /// Export every entity collection to a JSON snapshot
    Snapshot {
        #[arg(long)]
        out: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config.database_url()?;
    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_snapshot(path: Option<&Path>, config: &Config) -> anyhow::Result<Snapshot> {
    let snapshot = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read snapshot {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse snapshot {}", path.display()))?
        }
        None => {
            let pool = connect(config).await?;
            db::load_snapshot(&pool).await?
        }
    };

    let malformed = scan_ratings(&snapshot.feedback, |diagnostic| {
        warn!("ignoring malformed rating: {diagnostic}");
    });
    if malformed > 0 {
        info!(malformed, "some ratings were outside 1 to 5 and were skipped");
    }

    Ok(snapshot)
}

fn resolve_scope(args: &ScopeArgs, snapshot: &Snapshot) -> anyhow::Result<FeedbackScope> {
    let semester_id = if args.current_semester {
        let current = snapshot
            .current_semester()
            .context("no academic semester is marked as current")?;
        debug!(semester = %current.name, year = %current.academic_year, "using current semester");
        Some(current.id)
    } else {
        args.semester
    };

    Ok(FeedbackScope {
        semester_id,
        department_id: args.department,
        lecturer_id: None,
    })
}

fn write_output(out: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("written to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?.with_database_url(cli.database_url.clone());
    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());
    let options = config.dashboard_options();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Dashboard {
            scope,
            format,
            months_back,
            out,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &config).await?;
            let options = DashboardOptions {
                months_back: months_back.unwrap_or(options.months_back),
                scope: resolve_scope(&scope, &snapshot)?,
                ..options
            };
            let dashboard = dashboard::build_dashboard(&snapshot, today, &options);
            let content = match format {
                DashboardFormat::Markdown => dashboard::render_markdown(&dashboard),
                DashboardFormat::Json => {
                    let mut json = serde_json::to_string_pretty(&dashboard)?;
                    json.push('\n');
                    json
                }
            };
            write_output(out.as_deref(), &content)?;
        }
        Commands::Lecturers { scope, top, format } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &config).await?;
            let options = DashboardOptions {
                scope: resolve_scope(&scope, &snapshot)?,
                ..options
            };
            let rows = dashboard::lecturer_rows(&snapshot, &options, top);

            match format {
                TableFormat::Csv => export::write_csv(std::io::stdout().lock(), &rows)?,
                TableFormat::Table if rows.is_empty() => {
                    println!("No lecturers with rated feedback in this scope.");
                }
                TableFormat::Table => {
                    println!("Lecturers by average rating:");
                    for row in &rows {
                        println!(
                            "- {} ({}) {:.1} across {} feedback, comprehensive {:.1}, {}",
                            row.name,
                            row.department_name.as_deref().unwrap_or("no department"),
                            row.avg_rating,
                            row.feedback_count,
                            row.comprehensive_score,
                            dashboard::band_label(row.band)
                        );
                    }
                }
            }
        }
        Commands::Courses { scope, top, format } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &config).await?;
            let options = DashboardOptions {
                scope: resolve_scope(&scope, &snapshot)?,
                ..options
            };
            let rows = dashboard::course_rows(&snapshot, &options, top);

            match format {
                TableFormat::Csv => export::write_csv(std::io::stdout().lock(), &rows)?,
                TableFormat::Table if rows.is_empty() => {
                    println!("No courses with rated feedback in this scope.");
                }
                TableFormat::Table => {
                    println!("Courses by average rating:");
                    for row in &rows {
                        println!(
                            "- {} {} (level {}) {:.1} across {} feedback, {}",
                            row.code,
                            row.name,
                            row.level,
                            row.avg_rating,
                            row.feedback_count,
                            dashboard::band_label(row.band)
                        );
                    }
                }
            }
        }
        Commands::Snapshot { out } => {
            let pool = connect(&config).await?;
            let snapshot = db::load_snapshot(&pool).await?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(&out, json)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Snapshot with {} feedback written to {}.",
                snapshot.feedback.len(),
                out.display()
            );
        }
    }

    Ok(())
}
