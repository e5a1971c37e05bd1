//! oasgen CLI.
//!
//! Generates a module's persistence and API layers from a schema document,
//! shows what changed since the last run and rolls back to earlier runs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oasgen_compiler::codegen::FileAction;
use oasgen_compiler::fs::{OsFileStore, SystemClock};
use oasgen_compiler::schema::{DiffStatus, RollbackSelector};
use oasgen_compiler::{GenerateOptions, Generator, GeneratorConfig};

mod ui;

/// Environment value that turns on every generation option.
const DEV_ENV: &str = "dev";

#[derive(Parser)]
#[command(name = "oasgen", version)]
#[command(about = "Generates entities, migrations and controllers from an API schema")]
struct Cli {
    /// Log generator activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate artifacts from a schema, or from a past run with --rollback
    Generate {
        /// Primary schema document (.yaml, .yml or .json)
        #[arg(required_unless_present = "rollback")]
        schema: Option<PathBuf>,

        #[command(flatten)]
        project: ProjectArgs,

        /// Overwrite existing artifacts
        #[arg(short, long)]
        regenerate: bool,

        /// Emit migrations
        #[arg(short, long)]
        migrations: bool,

        /// Emit functional test stubs
        #[arg(short, long)]
        tests: bool,

        /// Only regenerate types changed since the last run, keeping hand-written code
        #[arg(long, conflicts_with = "rollback")]
        merge: bool,

        /// Do not record this run in the history
        #[arg(long)]
        no_history: bool,

        /// Regenerate from a past run: "last", a step count (1 = latest) or a date [time]
        #[arg(long, value_name = "SELECTOR")]
        rollback: Option<String>,

        /// Application environment; "dev" turns on --regenerate, --migrations and --tests
        #[arg(long, env = "OASGEN_ENV", hide_env_values = true)]
        env: Option<String>,
    },

    /// List recorded generation runs, most recent first
    History {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Show how a schema differs from the latest recorded run
    Diff {
        /// Primary schema document
        schema: PathBuf,

        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(Args)]
struct ProjectArgs {
    /// Project root receiving the generated modules
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

impl ProjectArgs {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig::with_output_dir(&self.output)
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            schema,
            project,
            regenerate,
            migrations,
            tests,
            merge,
            no_history,
            rollback,
            env,
        } => {
            let mut options = if env.as_deref() == Some(DEV_ENV) {
                GenerateOptions::dev()
            } else {
                GenerateOptions::default()
            };
            options.regenerate |= regenerate;
            options.migrations |= migrations;
            options.tests |= tests;
            options.merge = merge;
            options.no_history = no_history;

            match (rollback, schema) {
                (Some(selector), _) => rollback_run(&project, options, &selector),
                (None, Some(schema)) => generate(&project, options, &schema),
                (None, None) => Err(miette::miette!("A schema document is required")),
            }
        }
        Commands::History { project } => history(&project),
        Commands::Diff { schema, project } => diff(&project, &schema),
    }
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "oasgen=info" } else { "oasgen=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Generate artifacts from the working-tree schema.
fn generate(project: &ProjectArgs, options: GenerateOptions, schema: &Path) -> miette::Result<()> {
    let start = Instant::now();
    let spinner = ui::spinner(&format!("Generating from {}...", schema.display()));

    let generator = Generator::new(project.config(), options, &OsFileStore, &SystemClock);
    let result = generator.generate(schema);
    spinner.finish_and_clear();

    let report = result?;
    if let Some(diff) = &report.diff {
        print_diff_summary(diff);
    }
    print_report(&report);

    match &report.run {
        Some(run) => ui::dim(&format!("recorded as run {}", run.id)),
        None => ui::dim("run not recorded"),
    }
    ui::timing("Done", start.elapsed().as_millis());
    Ok(())
}

/// Regenerate artifacts from a past run.
fn rollback_run(project: &ProjectArgs, options: GenerateOptions, selector: &str) -> miette::Result<()> {
    let start = Instant::now();
    let selector: RollbackSelector = selector.parse()?;
    let spinner = ui::spinner(&format!("Rolling back to {}...", selector));

    let generator = Generator::new(project.config(), options, &OsFileStore, &SystemClock);
    let result = generator.rollback(&selector);
    spinner.finish_and_clear();

    let report = result?;
    print_report(&report);
    ui::timing("Rolled back", start.elapsed().as_millis());
    Ok(())
}

fn history(project: &ProjectArgs) -> miette::Result<()> {
    let generator = Generator::new(
        project.config(),
        GenerateOptions::default(),
        &OsFileStore,
        &SystemClock,
    );
    let runs = generator.list_runs()?;

    if runs.is_empty() {
        ui::info(&format!(
            "No runs recorded in {}",
            generator.config().history_path().display()
        ));
        return Ok(());
    }

    println!();
    ui::box_header(&format!("{} Generation History", ui::symbols::DIAMOND));
    ui::box_line("");
    for (step, run) in runs.iter().enumerate() {
        ui::box_line(&format!(
            "{:>3}  {}  {}",
            step + 1,
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
            run.id
        ));
    }
    ui::box_line("");
    ui::box_footer();
    ui::dim("roll back with: oasgen generate --rollback <step|date>");
    Ok(())
}

fn diff(project: &ProjectArgs, schema: &Path) -> miette::Result<()> {
    let spinner = ui::spinner("Comparing schemas...");
    let generator = Generator::new(
        project.config(),
        GenerateOptions::default(),
        &OsFileStore,
        &SystemClock,
    );
    let result = generator.diff_against_latest(schema);
    spinner.finish_and_clear();

    let Some((run, diff)) = result? else {
        ui::info("No runs recorded yet; every type is new");
        return Ok(());
    };

    if diff.is_unchanged() {
        ui::success(&format!("No changes since run {}", run.id));
        return Ok(());
    }

    println!();
    ui::box_header(&format!("{} Changes since {}", ui::symbols::TRIANGLE, run.id));
    ui::box_line("");
    for line in diff.format_changes().lines() {
        ui::box_line(line);
    }
    ui::box_line("");
    ui::box_footer();
    Ok(())
}

fn print_diff_summary(diff: &oasgen_compiler::schema::DiffResult) {
    let count = |status| diff.with_status(status).len();
    ui::info(&format!(
        "{} new {} {} changed {} {} unchanged",
        count(DiffStatus::New),
        ui::symbols::DOT,
        count(DiffStatus::Changed),
        ui::symbols::DOT,
        count(DiffStatus::Unchanged),
    ));
    for name in diff.with_status(DiffStatus::Removed) {
        ui::dim(&format!("{} was removed from the schema; its files were left in place", name));
    }
}

fn print_report(report: &oasgen_compiler::GenerateReport) {
    for outcome in &report.outcomes {
        match outcome.action {
            FileAction::Created | FileAction::Updated => {
                ui::file_line(&outcome.action.to_string(), &outcome.path.display().to_string())
            }
            FileAction::Unchanged | FileAction::Skipped => {}
        }
    }

    for warning in &report.warnings {
        ui::warning(&warning.to_string());
    }

    let untouched = report.outcomes.len() - report.written();
    ui::success(&format!(
        "{} written {} {} untouched {} {} warnings",
        report.written(),
        ui::symbols::DOT,
        untouched,
        ui::symbols::DOT,
        report.warnings.len()
    ));
}
