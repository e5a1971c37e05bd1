//! Schema registry: loads a primary document plus its includes into one flat
//! type map.
//!
//! Includes merge additively: a type already present is never overwritten,
//! and an include that redeclares it with a different shape is a schema
//! error. Rollback runs feed the snapshotted copies through the exact same
//! path, so nothing downstream needs to know where the files came from.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::diagnostic::GenError;
use crate::frontend::frontend_for_path;
use crate::fs::FileStore;
use crate::ir::{TypeDefinition, TypeMap, ATTRIBUTES_PROPERTY};
use crate::validate;

/// Keys listing included documents.
const INCLUDE_KEYS: [&str; 2] = ["uses", "includes"];

/// API version used when a document declares no servers.
pub const DEFAULT_VERSION: &str = "v1";

/// Where the schema documents of a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A primary document in the working tree; includes are resolved from
    /// its `uses` list relative to its directory.
    File(PathBuf),
    /// Snapshotted copies from a past run: the primary first, then its
    /// includes in their original order.
    Snapshot(Vec<PathBuf>),
}

impl SchemaSource {
    pub fn is_rollback(&self) -> bool {
        matches!(self, SchemaSource::Snapshot(_))
    }
}

/// Result of loading a schema.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    /// Every type of the primary document and its includes.
    pub types: TypeMap,
    /// API versions declared by the primary document's servers.
    pub versions: Vec<String>,
    /// Documents consumed, primary first.
    pub files: Vec<PathBuf>,
}

/// Loads and flattens schema documents.
pub struct SchemaRegistry<'a> {
    fs: &'a dyn FileStore,
}

impl<'a> SchemaRegistry<'a> {
    pub fn new(fs: &'a dyn FileStore) -> Self {
        Self { fs }
    }

    /// Loads `source`, validating required sections before returning.
    pub fn load(&self, source: &SchemaSource) -> Result<LoadedSchema, GenError> {
        let (primary, includes, document) = match source {
            SchemaSource::File(path) => {
                let document = self.read_document(path)?;
                let includes = include_paths(&document, path);
                (path.clone(), includes, document)
            }
            SchemaSource::Snapshot(files) => {
                let (primary, rest) = files.split_first().ok_or_else(|| {
                    GenError::io(PathBuf::new(), "rollback target holds no schema files")
                })?;
                let document = self.read_document(primary)?;
                (primary.clone(), rest.to_vec(), document)
            }
        };

        validate::validate_document(&document, &primary)?;

        let mut types = TypeMap::new();
        merge_schemas(&mut types, &document, &primary)?;

        for include in &includes {
            let included = self.read_document(include)?;
            if schemas_of(&included).is_none() {
                return Err(GenError::MissingSection {
                    path: include.clone(),
                    section: "components.schemas".to_string(),
                });
            }
            merge_schemas(&mut types, &included, include)?;
        }

        resolve_columns(&mut types);
        validate::validate_custom_types(&types)?;

        let mut files = vec![primary];
        files.extend(includes);

        Ok(LoadedSchema {
            types,
            versions: versions_of(&document),
            files,
        })
    }

    fn read_document(&self, path: &Path) -> Result<Value, GenError> {
        let frontend = frontend_for_path(path)?;
        let source = self.fs.read_to_string(path)?;
        frontend.parse_document(&source, path)
    }
}

fn schemas_of(document: &Value) -> Option<&serde_json::Map<String, Value>> {
    document
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
}

/// Adds the document's schemas to `types`, keeping existing entries.
fn merge_schemas(types: &mut TypeMap, document: &Value, path: &Path) -> Result<(), GenError> {
    let Some(schemas) = schemas_of(document) else {
        return Ok(());
    };

    for (name, schema) in schemas {
        match types.get(name) {
            Some(existing) if existing.raw == *schema => {
                debug!(type_name = %name, file = %path.display(), "identical redeclaration ignored");
            }
            Some(_) => {
                return Err(GenError::ShapeConflict {
                    name: name.clone(),
                    path: path.to_path_buf(),
                });
            }
            None => {
                types.insert(name.clone(), TypeDefinition::from_schema(name, schema));
            }
        }
    }

    Ok(())
}

/// Replaces each entity's columns with the properties of its attributes type.
fn resolve_columns(types: &mut TypeMap) {
    let mut resolved = Vec::new();

    for (name, def) in types.iter() {
        let Some(attributes) = def.property(ATTRIBUTES_PROPERTY) else {
            continue;
        };

        let columns = match types.get(&attributes.data_type) {
            Some(attributes_type) if attributes_type.name != *name => {
                Some(attributes_type.properties.clone())
            }
            _ => def
                .raw
                .get("properties")
                .and_then(|p| p.get(ATTRIBUTES_PROPERTY))
                .filter(|a| a.get("properties").is_some())
                .map(|inline| TypeDefinition::from_schema(ATTRIBUTES_PROPERTY, inline).properties),
        };

        if let Some(columns) = columns {
            resolved.push((name.clone(), columns));
        }
    }

    for (name, columns) in resolved {
        if let Some(def) = types.get_mut(&name) {
            def.columns = columns;
        }
    }
}

fn include_paths(document: &Value, primary: &Path) -> Vec<PathBuf> {
    let base = primary.parent().unwrap_or_else(|| Path::new(""));

    let Some(declared) = INCLUDE_KEYS.iter().find_map(|key| document.get(*key)) else {
        return Vec::new();
    };

    let entries: Vec<&str> = match declared {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::Object(map) => map.values().filter_map(Value::as_str).collect(),
        Value::String(single) => vec![single.as_str()],
        _ => Vec::new(),
    };

    entries.into_iter().map(|entry| base.join(entry)).collect()
}

fn versions_of(document: &Value) -> Vec<String> {
    let mut versions: Vec<String> = Vec::new();

    if let Some(servers) = document.get("servers").and_then(Value::as_array) {
        for server in servers {
            let version = server
                .get("variables")
                .and_then(|v| v.get("basePath"))
                .and_then(|b| b.get("default"))
                .and_then(Value::as_str)
                .map(|v| v.trim_matches('/').to_string());

            if let Some(version) = version.filter(|v| !v.is_empty()) {
                if !versions.contains(&version) {
                    versions.push(version);
                }
            }
        }
    }

    if versions.is_empty() {
        versions.push(DEFAULT_VERSION.to_string());
    }
    versions
}
