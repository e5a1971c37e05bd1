//! Artifact generation.
//!
//! Each generator turns a [`TypeDefinition`] (or the module as a whole) into
//! an [`AssemblyUnit`]; this module decides which units a type produces and
//! where they live. Writing them out is the job of [`writer`].

pub mod assembler;
pub mod naming;
pub mod writer;

mod controllers;
mod entities;
mod form_requests;
mod functional_tests;
mod migrations;
mod module_config;

use std::path::PathBuf;

use tracing::debug;

use crate::config::module_name;
use crate::context::GenerationContext;
use crate::diagnostic::GenError;
use crate::fs::FileStore;
use crate::ir::{Cardinality, TypeDefinition};
use crate::relation::{relations_for, PivotPlan, PivotRegistry, CLASS_EXTENSION};
use crate::schema::DiffStatus;

pub use assembler::{AssemblyUnit, CodeAssembler};
pub use controllers::DEFAULT_CONTROLLER;
pub use entities::Accessor;
pub use migrations::STAMP_FORMAT;
pub use module_config::CONFIG_FILE;
pub use writer::{ArtifactWriter, FileAction, FileOutcome};

/// A unit and the file it belongs in.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub unit: AssemblyUnit,
}

impl Artifact {
    fn new(path: PathBuf, unit: AssemblyUnit) -> Self {
        Self { path, unit }
    }
}

/// Artifacts of one entity plus the relation problems met on the way.
#[derive(Debug, Default)]
pub struct EntityArtifacts {
    pub artifacts: Vec<Artifact>,
    /// Non-fatal: the offending edges were left out.
    pub warnings: Vec<GenError>,
}

/// Artifacts shared by every entity of a module.
pub fn module_artifacts(ctx: &GenerationContext<'_>) -> Vec<Artifact> {
    vec![
        Artifact::new(
            ctx.config
                .controllers_path(ctx.version)
                .join(class_file(DEFAULT_CONTROLLER)),
            controllers::default_controller_unit(ctx),
        ),
        Artifact::new(
            ctx.config.config_path(ctx.version).join(CONFIG_FILE),
            module_config::module_config_unit(ctx),
        ),
    ]
}

/// Whether `def` takes part in this run. In merge mode only new and changed
/// types are regenerated.
pub fn should_generate(ctx: &GenerationContext<'_>, def: &TypeDefinition) -> bool {
    match (ctx.is_merge(), ctx.diff) {
        (true, Some(diff)) => matches!(
            diff.status(&def.name),
            Some(DiffStatus::New) | Some(DiffStatus::Changed) | None
        ),
        _ => true,
    }
}

/// Artifacts of entity `def`.
///
/// Many-to-many pivots are claimed through `pivots`; only the claimant that
/// owns a pair emits its class and migration.
pub fn entity_artifacts(
    ctx: &GenerationContext<'_>,
    def: &TypeDefinition,
    pivots: &mut PivotRegistry,
    fs: &dyn FileStore,
) -> Result<EntityArtifacts, GenError> {
    let (edges, warnings) = relations_for(def, ctx.types);
    let entities_dir = ctx.config.entities_path(ctx.version);

    let plans: Vec<Option<PivotPlan>> = edges
        .iter()
        .map(|edge| {
            (edge.cardinality == Cardinality::ManyToMany)
                .then(|| pivots.claim(&def.name, &edge.target, &entities_dir, fs))
        })
        .collect();

    let accessors: Vec<Accessor<'_>> = edges
        .iter()
        .zip(&plans)
        .map(|(edge, plan)| Accessor {
            edge,
            pivot: plan.as_ref(),
        })
        .collect();

    let mut artifacts = vec![Artifact::new(
        entities_dir.join(class_file(&def.name)),
        entities::entity_unit(ctx, def, &accessors),
    )];

    for plan in plans.iter().flatten().filter(|p| p.owned) {
        artifacts.push(Artifact::new(plan.path.clone(), entities::pivot_unit(ctx, plan)));
        if ctx.options.migrations {
            let (path, _) = migrations::create_migration_path(ctx, fs, &plan.table())?;
            artifacts.push(Artifact::new(path, migrations::create_pivot_unit(plan)));
        }
    }

    artifacts.push(Artifact::new(
        ctx.config
            .controllers_path(ctx.version)
            .join(class_file(&controllers::controller_name(&def.name))),
        controllers::controller_unit(ctx, &def.name),
    ));
    artifacts.push(Artifact::new(
        ctx.config
            .form_requests_path(ctx.version)
            .join(class_file(&form_requests::form_request_name(&def.name))),
        form_requests::form_request_unit(ctx, def),
    ));

    if ctx.options.migrations {
        artifacts.extend(table_migration(ctx, def, fs)?);
    }

    if ctx.options.tests {
        artifacts.push(Artifact::new(
            ctx.config
                .tests_path()
                .join(module_name(ctx.version))
                .join(class_file(&functional_tests::cest_name(&def.name))),
            functional_tests::cest_unit(ctx, def),
        ));
    }

    Ok(EntityArtifacts { artifacts, warnings })
}

/// The create migration of a table, or in merge mode, an alter migration
/// when the table was migrated before.
fn table_migration(
    ctx: &GenerationContext<'_>,
    def: &TypeDefinition,
    fs: &dyn FileStore,
) -> Result<Option<Artifact>, GenError> {
    let table = naming::table_name(&def.name);
    let (path, existed) = migrations::create_migration_path(ctx, fs, &table)?;

    if !(existed && ctx.is_merge()) {
        return Ok(Some(Artifact::new(path, migrations::create_table_unit(def))));
    }

    let changes = ctx.diff.map(|d| d.changes(&def.name)).unwrap_or_default();
    match migrations::alter_table_unit(ctx, def, changes) {
        Some(unit) => Ok(Some(Artifact::new(
            migrations::alter_migration_path(ctx, &table),
            unit,
        ))),
        None => {
            debug!(entity = %def.name, "no column changes, no alter migration");
            Ok(None)
        }
    }
}

fn class_file(class: &str) -> String {
    format!("{}.{}", class, CLASS_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::context::GenerateOptions;
    use crate::fs::OsFileStore;
    use crate::ir::TypeMap;
    use crate::schema::diff_types;
    use chrono::NaiveDateTime;
    use serde_json::json;
    use tempfile::TempDir;

    fn types() -> TypeMap {
        let mut types = TypeMap::new();
        for (name, schema) in [
            ("Post", json!({ "type": "object", "properties": {
                "title": { "type": "string" },
                "relationships": { "type": "Tag[]" }
            }})),
            ("Tag", json!({ "type": "object", "properties": {
                "name": { "type": "string" },
                "relationships": { "type": "Post[]" }
            }})),
        ] {
            types.insert(name.to_string(), TypeDefinition::from_schema(name, &schema));
        }
        types
    }

    fn file_names(artifacts: &[Artifact]) -> Vec<String> {
        artifacts
            .iter()
            .map(|a| a.path.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_pivot_emitted_once_per_pair() {
        let dir = TempDir::new().unwrap();
        let types = types();
        let options = GenerateOptions {
            migrations: true,
            ..GenerateOptions::default()
        };
        let config = GeneratorConfig::with_output_dir(dir.path());
        let ctx = GenerationContext {
            types: &types,
            options: &options,
            config: &config,
            version: "v1",
            diff: None,
            generated_at: NaiveDateTime::default(),
        };
        let mut pivots = PivotRegistry::new();

        let post = entity_artifacts(&ctx, &types["Post"], &mut pivots, &OsFileStore).unwrap();
        let tag = entity_artifacts(&ctx, &types["Tag"], &mut pivots, &OsFileStore).unwrap();

        let post_files = file_names(&post.artifacts);
        assert!(post_files.contains(&"PostTag.php".to_string()));
        assert!(post_files.iter().any(|f| f.ends_with("_create_post_tag_table.php")));
        assert!(post_files.iter().any(|f| f.ends_with("_create_post_table.php")));

        let tag_files = file_names(&tag.artifacts);
        assert!(!tag_files.iter().any(|f| f.contains("PostTag") || f.contains("post_tag")));
        assert!(post.warnings.is_empty() && tag.warnings.is_empty());
    }

    #[test]
    fn test_optional_artifacts_follow_options() {
        let dir = TempDir::new().unwrap();
        let types = types();
        let options = GenerateOptions::default();
        let config = GeneratorConfig::with_output_dir(dir.path());
        let ctx = GenerationContext {
            types: &types,
            options: &options,
            config: &config,
            version: "v1",
            diff: None,
            generated_at: NaiveDateTime::default(),
        };

        let tag = entity_artifacts(&ctx, &types["Tag"], &mut PivotRegistry::new(), &OsFileStore).unwrap();
        assert_eq!(
            file_names(&tag.artifacts),
            vec!["Tag.php", "PostTag.php", "TagController.php", "TagFormRequest.php"]
        );
    }

    #[test]
    fn test_merge_skips_unchanged_types() {
        let types = types();
        let diff = diff_types(&types, &types);
        let options = GenerateOptions {
            merge: true,
            ..GenerateOptions::default()
        };
        let config = GeneratorConfig::default();
        let ctx = GenerationContext {
            types: &types,
            options: &options,
            config: &config,
            version: "v1",
            diff: Some(&diff),
            generated_at: NaiveDateTime::default(),
        };

        assert!(!should_generate(&ctx, &types["Post"]));
        let regenerate = GenerationContext { diff: None, ..ctx };
        assert!(should_generate(&regenerate, &types["Post"]));
    }

    #[test]
    fn test_module_artifacts() {
        let types = types();
        let options = GenerateOptions::default();
        let config = GeneratorConfig::default();
        let ctx = GenerationContext {
            types: &types,
            options: &options,
            config: &config,
            version: "v1",
            diff: None,
            generated_at: NaiveDateTime::default(),
        };

        let paths: Vec<_> = module_artifacts(&ctx).into_iter().map(|a| a.path).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("./modules/V1/Http/Controllers/DefaultController.php"),
                PathBuf::from("./modules/V1/Config/config.php"),
            ]
        );
    }
}
