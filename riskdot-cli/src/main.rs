//! Riskdot CLI - risk-band and dot rollups over a hierarchy snapshot

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output (for a fixed --now)

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use riskdot_core::config;
use riskdot_core::hierarchy::atomic_write;
use riskdot_core::query::{
    self, RecommendationsReport, Scope, ScopeRollup, StepFilters, StepRollup, TaskFilters,
};
use riskdot_core::report;
use riskdot_core::{ControlsProgress, Dot, HierarchySnapshot};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "riskdot")]
#[command(about = "Risk-band and dot rollups for line/machine/task/step hierarchies")]
#[command(version = env!("RISKDOT_VERSION"))]
struct Cli {
    /// Path to the hierarchy snapshot JSON file (default: from config)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Path to config file (default: auto-discover)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate due dates against this instant instead of the current time
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rollup for every line
    Lines {
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Write JSON output to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Rollup for every machine under one line
    Machines {
        /// Line id
        #[arg(long)]
        line: String,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Rollup for every task under one machine
    Tasks {
        /// Machine id
        #[arg(long)]
        machine: String,

        /// Only tasks with this category id
        #[arg(long)]
        task_category: Option<String>,

        /// Only tasks with this phase id
        #[arg(long)]
        task_phase: Option<String>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Per-step rollup for one task
    Steps {
        /// Task id
        #[arg(long)]
        task: String,

        /// Only steps with this dot color (gray/green/yellow/orange/red)
        #[arg(long)]
        dot: Option<String>,

        /// Only steps recommending this category id
        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Additional-control progress for one scope
    Progress {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Open recommended actions for one scope, grouped by category
    Recommendations {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without running a query
    Validate,
    /// Show the resolved configuration (merged defaults + config file)
    Show,
}

/// Exactly one of --line / --machine / --task
#[derive(clap::Args)]
struct ScopeArgs {
    /// Line id
    #[arg(long, conflicts_with_all = ["machine", "task"])]
    line: Option<String>,

    /// Machine id
    #[arg(long, conflicts_with = "task")]
    machine: Option<String>,

    /// Task id
    #[arg(long)]
    task: Option<String>,
}

impl ScopeArgs {
    fn into_scope(self) -> anyhow::Result<Scope> {
        match (self.line, self.machine, self.task) {
            (Some(id), None, None) => Ok(Scope::Line(id)),
            (None, Some(id), None) => Ok(Scope::Machine(id)),
            (None, None, Some(id)) => Ok(Scope::Task(id)),
            _ => anyhow::bail!("exactly one of --line, --machine, --task is required"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let project_root = std::env::current_dir().context("failed to read current directory")?;
    let resolved_config = config::load_and_resolve(&project_root, cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(config_path) = &resolved_config.config_path {
        eprintln!("Using config: {}", config_path.display());
    }

    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Commands::Lines { format, output } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &resolved_config)?;
            let rollups = query::lines_rollup(&snapshot, now);
            emit_scopes(&rollups, format, output.as_deref())
        }
        Commands::Machines {
            line,
            format,
            output,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &resolved_config)?;
            let rollups = query::machines_for_line(&snapshot, &line, now)?;
            emit_scopes(&rollups, format, output.as_deref())
        }
        Commands::Tasks {
            machine,
            task_category,
            task_phase,
            format,
            output,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &resolved_config)?;
            let filters = TaskFilters {
                task_category_id: task_category,
                task_phase_id: task_phase,
            };
            let rollups = query::tasks_for_machine(&snapshot, &machine, &filters, now)?;
            emit_scopes(&rollups, format, output.as_deref())
        }
        Commands::Steps {
            task,
            dot,
            category,
            format,
            output,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &resolved_config)?;
            let filters = StepFilters {
                dot: dot.map(|s| s.parse::<Dot>()).transpose()?,
                category_id: category,
            };
            let rows = query::steps_for_task(&snapshot, &task, &filters)?;
            emit_steps(&rows, format, output.as_deref())
        }
        Commands::Progress { scope, format } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &resolved_config)?;
            let progress = query::scope_progress(&snapshot, &scope.into_scope()?, now)?;
            emit_progress(&progress, format)
        }
        Commands::Recommendations {
            scope,
            format,
            output,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref(), &resolved_config)?;
            let rep = query::recommendations(&snapshot, &scope.into_scope()?, now)?;
            emit_recommendations(&rep, format, output.as_deref())
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate => {
                // load_and_resolve above already validated; also check the
                // named matrix actually exists.
                resolved_config.matrix_registry()?;
                println!("Configuration is valid");
                Ok(())
            }
            ConfigAction::Show => {
                println!("active_matrix: {}", resolved_config.active_matrix);
                match &resolved_config.snapshot_path {
                    Some(path) => println!("snapshot_path: {}", path.display()),
                    None => println!("snapshot_path: (none)"),
                }
                match &resolved_config.config_path {
                    Some(path) => println!("config_path: {}", path.display()),
                    None => println!("config_path: (defaults)"),
                }
                Ok(())
            }
        },
    }
}

/// Load the snapshot from the CLI flag, falling back to the config file
fn load_snapshot(
    flag: Option<&Path>,
    resolved_config: &config::ResolvedConfig,
) -> anyhow::Result<HierarchySnapshot> {
    let path = flag
        .or(resolved_config.snapshot_path.as_deref())
        .context("no snapshot file given: pass --snapshot or set snapshot_path in config")?;
    HierarchySnapshot::load(path)
}

fn emit_scopes(
    rollups: &[ScopeRollup],
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report::render_scopes_text(rollups)),
        OutputFormat::Json => emit_json(report::render_json(&rollups), output)?,
    }
    Ok(())
}

fn emit_steps(
    rows: &[StepRollup],
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report::render_steps_text(rows)),
        OutputFormat::Json => emit_json(report::render_json(&rows), output)?,
    }
    Ok(())
}

fn emit_progress(progress: &ControlsProgress, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report::render_progress_text(progress)),
        OutputFormat::Json => println!("{}", report::render_json(progress)),
    }
    Ok(())
}

fn emit_recommendations(
    rep: &RecommendationsReport,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report::render_recommendations_text(rep)),
        OutputFormat::Json => emit_json(report::render_json(rep), output)?,
    }
    Ok(())
}

/// Print JSON to stdout, or write it atomically to `output`
fn emit_json(json: String, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            atomic_write(path, &json)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
