//! Run context shared by the artifact generators.

use chrono::NaiveDateTime;

use crate::config::GeneratorConfig;
use crate::ir::{TypeDefinition, TypeMap};
use crate::schema::DiffResult;

/// Options bag of a generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Overwrite existing artifacts whose text differs.
    pub regenerate: bool,
    /// Emit migration files.
    pub migrations: bool,
    /// Emit functional test stubs.
    pub tests: bool,
    /// Diff against the latest run and merge into existing artifacts.
    pub merge: bool,
    /// Do not record the run in the history.
    pub no_history: bool,
}

impl GenerateOptions {
    /// Options of a development environment: regenerate everything, with
    /// migrations and tests.
    pub fn dev() -> Self {
        Self {
            regenerate: true,
            migrations: true,
            tests: true,
            ..Self::default()
        }
    }
}

/// Read-only state of one generation pass over one API version.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub types: &'a TypeMap,
    pub options: &'a GenerateOptions,
    pub config: &'a GeneratorConfig,
    /// API version being generated, e.g. `v1`.
    pub version: &'a str,
    /// Diff against the latest run, present in merge mode.
    pub diff: Option<&'a DiffResult>,
    /// Wall-clock time of the run, used for migration stamps.
    pub generated_at: NaiveDateTime,
}

impl<'a> GenerationContext<'a> {
    /// Entities to generate, alphabetically.
    pub fn entities(&self) -> impl Iterator<Item = &'a TypeDefinition> {
        self.types.values().filter(|def| def.is_entity())
    }

    pub fn is_merge(&self) -> bool {
        self.options.merge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dev_options() {
        let options = GenerateOptions::dev();
        assert!(options.regenerate && options.migrations && options.tests);
        assert!(!options.merge && !options.no_history);
    }

    #[test]
    fn test_entities_skip_support_and_custom_types() {
        let mut types = TypeMap::new();
        for name in ["ID", "Post", "PostAttributes", "PostRelationships", "Tag"] {
            let schema = json!({ "type": "object", "properties": {} });
            types.insert(name.to_string(), TypeDefinition::from_schema(name, &schema));
        }
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

        let names: Vec<_> = ctx.entities().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Post", "Tag"]);
    }
}
