//! # oasgen compiler
//!
//! Generates the persistence and API layers of a module (entities, pivots,
//! migrations, controllers, form requests, config) from an OpenAPI-style
//! schema document, and keeps a history of the schemas it consumed so a run
//! can be diffed against or rolled back to an earlier one.
//!
//! ## Architecture
//!
//! ```text
//! Schema document (+ includes)
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Registry   │  Parse, validate, merge into one TypeMap
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │     Diff     │  Merge mode only: classify types against the latest run
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Relation   │  Cardinality and pivot ownership per entity
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  AssemblyUnits, written through the write policy
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   History    │  Snapshot the consumed schema files
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oasgen_compiler::{GenerateOptions, Generator, GeneratorConfig};
//! use oasgen_compiler::fs::{OsFileStore, SystemClock};
//!
//! let generator = Generator::new(
//!     GeneratorConfig::with_output_dir("."),
//!     GenerateOptions::dev(),
//!     &OsFileStore,
//!     &SystemClock,
//! );
//! let report = generator.generate("api/openapi.yaml".as_ref())?;
//! ```
//!
//! A generator run assumes it is the only one working on the output
//! directory; concurrent runs must be serialised by the caller.

pub mod codegen;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod frontend;
pub mod fs;
pub mod ir;
pub mod registry;
pub mod relation;
pub mod schema;
pub mod validate;

use std::path::Path;

use tracing::{debug, info, warn};

use codegen::{ArtifactWriter, FileAction, FileOutcome};
use fs::{Clock, FileStore};
use ir::TypeMap;
use registry::{LoadedSchema, SchemaRegistry, SchemaSource};
use relation::PivotRegistry;
use schema::{diff_types, DiffResult, GenerationRun, HistoryStore, RollbackSelector};

pub use config::GeneratorConfig;
pub use context::{GenerateOptions, GenerationContext};
pub use diagnostic::GenError;

/// Runs generation, rollback and history queries against one project.
pub struct Generator<'a> {
    config: GeneratorConfig,
    options: GenerateOptions,
    fs: &'a dyn FileStore,
    clock: &'a dyn Clock,
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// One entry per artifact considered, in generation order.
    pub outcomes: Vec<FileOutcome>,
    /// Non-fatal problems: skipped relations, files left untouched, history
    /// failures.
    pub warnings: Vec<GenError>,
    /// Classification against the latest run, present in merge mode.
    pub diff: Option<DiffResult>,
    /// The run recorded in the history, if any.
    pub run: Option<GenerationRun>,
}

impl GenerateReport {
    /// Outcomes with the given action.
    pub fn with_action(&self, action: FileAction) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(move |o| o.action == action)
    }

    /// Number of files created or updated.
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.action.is_write()).count()
    }
}

impl<'a> Generator<'a> {
    pub fn new(
        config: GeneratorConfig,
        options: GenerateOptions,
        fs: &'a dyn FileStore,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            config,
            options,
            fs,
            clock,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The history store of the project.
    pub fn history(&self) -> HistoryStore<'a> {
        HistoryStore::new(self.config.history_path(), self.fs, self.clock)
    }

    /// Generates artifacts from the schema at `schema` and records the run.
    ///
    /// Schema errors are returned before anything is written. Errors met
    /// while generating a single entity are collected as warnings and the
    /// remaining entities are still generated.
    pub fn generate(&self, schema: &Path) -> Result<GenerateReport, GenError> {
        self.run(&SchemaSource::File(schema.to_path_buf()), self.options)
    }

    /// Regenerates artifacts from the schema of the run picked by `selector`.
    ///
    /// Rolled-back artifacts overwrite the current ones, so the run always
    /// regenerates and never merges. Rollbacks are not recorded.
    pub fn rollback(&self, selector: &RollbackSelector) -> Result<GenerateReport, GenError> {
        let files = self.history().resolve_rollback_target(selector)?;
        info!(selector = %selector, files = files.len(), "rolling back");

        let options = GenerateOptions {
            regenerate: true,
            merge: false,
            ..self.options
        };
        self.run(&SchemaSource::Snapshot(files), options)
    }

    /// Diff of the schema at `schema` against the latest run, or `None`
    /// when no run was recorded yet.
    pub fn diff_against_latest(&self, schema: &Path) -> Result<Option<(GenerationRun, DiffResult)>, GenError> {
        let loaded = self.load(&SchemaSource::File(schema.to_path_buf()))?;
        let Some(run) = self.history().latest_run()? else {
            return Ok(None);
        };
        let historical = self.load_run(&run)?;
        Ok(Some((run, diff_types(&loaded.types, &historical))))
    }

    /// Recorded runs, most recent first.
    pub fn list_runs(&self) -> Result<Vec<GenerationRun>, GenError> {
        self.history().list_runs()
    }

    fn load(&self, source: &SchemaSource) -> Result<LoadedSchema, GenError> {
        SchemaRegistry::new(self.fs).load(source)
    }

    fn load_run(&self, run: &GenerationRun) -> Result<TypeMap, GenError> {
        let files = self.history().run_files(run)?;
        Ok(self.load(&SchemaSource::Snapshot(files))?.types)
    }

    fn run(&self, source: &SchemaSource, options: GenerateOptions) -> Result<GenerateReport, GenError> {
        let loaded = self.load(source)?;
        let mut report = GenerateReport::default();

        if options.merge {
            report.diff = self.merge_diff(&loaded.types, &mut report.warnings);
        }

        let writer = ArtifactWriter::new(self.fs, options);
        let generated_at = self.clock.now();

        for version in &loaded.versions {
            let ctx = GenerationContext {
                types: &loaded.types,
                options: &options,
                config: &self.config,
                version,
                diff: report.diff.as_ref(),
                generated_at,
            };
            let (outcomes, warnings) = self.generate_module(&ctx, &writer);
            report.outcomes.extend(outcomes);
            report.warnings.extend(warnings);
        }

        if source.is_rollback() || options.no_history {
            debug!("run not recorded");
        } else {
            match self.record(&loaded) {
                Ok(run) => report.run = Some(run),
                Err(err) => {
                    warn!(error = %err, "generation history not recorded");
                    report.warnings.push(err);
                }
            }
        }

        info!(
            written = report.written(),
            warnings = report.warnings.len(),
            "generation finished"
        );
        Ok(report)
    }

    /// Diff against the latest run. Without a usable run every type counts
    /// as new.
    fn merge_diff(&self, types: &TypeMap, warnings: &mut Vec<GenError>) -> Option<DiffResult> {
        let latest = match self.history().latest_run() {
            Ok(Some(run)) => run,
            Ok(None) => {
                debug!("no previous run, merging against an empty history");
                return Some(diff_types(types, &TypeMap::new()));
            }
            Err(err) => {
                warn!(error = %err, "history unreadable, merging against an empty history");
                warnings.push(err);
                return Some(diff_types(types, &TypeMap::new()));
            }
        };

        match self.load_run(&latest) {
            Ok(historical) => {
                let diff = diff_types(types, &historical);
                for (name, entry) in diff.iter() {
                    debug!(type_name = name, status = %entry.status, "diff");
                }
                Some(diff)
            }
            Err(err) => {
                warn!(run = %latest.id, error = %err, "previous run unreadable, merging against an empty history");
                warnings.push(err);
                Some(diff_types(types, &TypeMap::new()))
            }
        }
    }

    fn generate_module(
        &self,
        ctx: &GenerationContext<'_>,
        writer: &ArtifactWriter<'_>,
    ) -> (Vec<FileOutcome>, Vec<GenError>) {
        let mut outcomes = Vec::new();
        let mut warnings = Vec::new();
        let mut pivots = PivotRegistry::new();

        let mut write = |artifact: codegen::Artifact, warnings: &mut Vec<GenError>| {
            match writer.write(&artifact.path, artifact.unit) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    warn!(file = %artifact.path.display(), error = %err, "artifact left untouched");
                    warnings.push(err);
                }
            }
        };

        for artifact in codegen::module_artifacts(ctx) {
            write(artifact, &mut warnings);
        }

        for def in ctx.entities() {
            if !codegen::should_generate(ctx, def) {
                debug!(entity = %def.name, "unchanged, skipped");
                continue;
            }

            match codegen::entity_artifacts(ctx, def, &mut pivots, self.fs) {
                Ok(set) => {
                    for err in set.warnings {
                        warn!(entity = %def.name, error = %err, "relation skipped");
                        warnings.push(err);
                    }
                    for artifact in set.artifacts {
                        write(artifact, &mut warnings);
                    }
                }
                Err(err) => {
                    warn!(entity = %def.name, error = %err, "entity skipped");
                    warnings.push(err);
                }
            }
        }

        (outcomes, warnings)
    }

    fn record(&self, loaded: &LoadedSchema) -> Result<GenerationRun, GenError> {
        let history = self.history();
        let run_id = history.next_run_id()?;
        history.snapshot(&loaded.files, &run_id)
    }
}
