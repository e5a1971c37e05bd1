//! Migration classes.
//!
//! A table gets one `create` migration, reused across runs: an existing
//! `*_create_<table>_table.php` keeps its name. In merge mode column changes
//! of an already migrated table go to a new `alter` migration instead.

use std::path::PathBuf;

use serde_json::Value;

use super::assembler::{quote, AssemblyUnit, CodeAssembler, MethodDecl, Visibility};
use super::naming::{table_name, to_pascal_case};
use crate::context::GenerationContext;
use crate::diagnostic::GenError;
use crate::fs::FileStore;
use crate::ir::{PropertyDef, TypeDefinition, SOFT_DELETE_COLUMN};
use crate::relation::{PivotPlan, CLASS_EXTENSION};
use crate::schema::PropertyChange;

/// Layout of the migration file stamp.
pub const STAMP_FORMAT: &str = "%Y_%m_%d_%H%M%S";

const MIGRATION_CLASS: &str = "Illuminate\\Database\\Migrations\\Migration";
const BLUEPRINT_CLASS: &str = "Illuminate\\Database\\Schema\\Blueprint";
const SCHEMA_FACADE: &str = "Illuminate\\Support\\Facades\\Schema";

/// Primary key column, created by `bigIncrements`.
const KEY_COLUMN: &str = "id";

/// Path of the create migration of `table`, reusing an existing one.
pub fn create_migration_path(
    ctx: &GenerationContext<'_>,
    fs: &dyn FileStore,
    table: &str,
) -> Result<(PathBuf, bool), GenError> {
    let dir = ctx.config.migrations_path(ctx.version);
    let suffix = format!("_create_{}_table.{}", table, CLASS_EXTENSION);

    if let Some(existing) = fs.list_dir(&dir)?.into_iter().find(|name| name.ends_with(&suffix)) {
        return Ok((dir.join(existing), true));
    }

    Ok((dir.join(format!("{}{}", stamp(ctx), suffix)), false))
}

/// Path of a new alter migration of `table`.
pub fn alter_migration_path(ctx: &GenerationContext<'_>, table: &str) -> PathBuf {
    ctx.config
        .migrations_path(ctx.version)
        .join(format!("{}_alter_{}_table.{}", stamp(ctx), table, CLASS_EXTENSION))
}

/// Create migration of an entity table.
pub fn create_table_unit(def: &TypeDefinition) -> AssemblyUnit {
    let table = table_name(&def.name);

    let mut lines = vec![format!("$table->bigIncrements('{}');", KEY_COLUMN)];
    lines.extend(
        def.columns
            .iter()
            .filter(|c| c.name != KEY_COLUMN)
            .map(column_statement),
    );

    migration_unit(
        &format!("Create{}Table", to_pascal_case(&table)),
        schema_block("create", &table, &lines),
        vec![format!("Schema::dropIfExists({});", quote(&table))],
    )
}

/// Create migration of a pivot table.
pub fn create_pivot_unit(plan: &PivotPlan) -> AssemblyUnit {
    let table = plan.table();
    let lines = vec![
        format!("$table->bigIncrements('{}');", KEY_COLUMN),
        format!("$table->unsignedBigInteger('{}_id');", table_name(&plan.first)),
        format!("$table->unsignedBigInteger('{}_id');", table_name(&plan.second)),
        "$table->timestamps();".to_string(),
    ];

    migration_unit(
        &format!("Create{}Table", to_pascal_case(&table)),
        schema_block("create", &table, &lines),
        vec![format!("Schema::dropIfExists({});", quote(&table))],
    )
}

/// Alter migration applying `changes` to an entity table, or `None` when
/// there is nothing to apply.
pub fn alter_table_unit(
    ctx: &GenerationContext<'_>,
    def: &TypeDefinition,
    changes: &[PropertyChange],
) -> Option<AssemblyUnit> {
    if changes.is_empty() {
        return None;
    }

    let table = table_name(&def.name);
    let mut up = Vec::new();
    let mut down = Vec::new();

    for change in changes {
        match change {
            PropertyChange::Added { column } => {
                up.push(column_statement(column));
                down.push(drop_statement(column));
            }
            PropertyChange::Removed { column } => {
                up.push(drop_statement(column));
                down.push(column_statement(column));
            }
            PropertyChange::TypeChanged { old_column, new_column } => {
                up.push(change_statement(new_column));
                down.push(change_statement(old_column));
            }
        }
    }

    let class = format!(
        "Alter{}Table{}",
        to_pascal_case(&table),
        ctx.generated_at.format("%Y%m%d%H%M%S")
    );
    Some(migration_unit(
        &class,
        schema_block("table", &table, &up),
        schema_block("table", &table, &down),
    ))
}

fn stamp(ctx: &GenerationContext<'_>) -> String {
    ctx.generated_at.format(STAMP_FORMAT).to_string()
}

fn migration_unit(class: &str, up: Vec<String>, down: Vec<String>) -> AssemblyUnit {
    let mut asm = CodeAssembler::new();
    asm.use_decl(MIGRATION_CLASS)
        .use_decl(BLUEPRINT_CLASS)
        .use_decl(SCHEMA_FACADE)
        .start_class(class, Some("Migration"))
        .start_method(MethodDecl::new(Visibility::Public, "up"));
    for line in up {
        asm.body_line(line);
    }
    asm.start_method(MethodDecl::new(Visibility::Public, "down"));
    for line in down {
        asm.body_line(line);
    }
    asm.finish()
}

fn schema_block(call: &str, table: &str, statements: &[String]) -> Vec<String> {
    let mut lines = vec![format!(
        "Schema::{}({}, function (Blueprint $table) {{",
        call,
        quote(table)
    )];
    lines.extend(statements.iter().map(|s| format!("    {}", s)));
    lines.push("});".to_string());
    lines
}

/// Column definition, e.g. `$table->string('title', 255)->nullable();`.
pub fn column_statement(column: &PropertyDef) -> String {
    format!("{};", column_definition(column))
}

fn change_statement(column: &PropertyDef) -> String {
    format!("{}->change();", column_definition(column))
}

fn drop_statement(column: &PropertyDef) -> String {
    if column.name == SOFT_DELETE_COLUMN {
        return "$table->dropSoftDeletes();".to_string();
    }
    format!("$table->dropColumn({});", quote(&column.name))
}

fn column_definition(column: &PropertyDef) -> String {
    if column.name == SOFT_DELETE_COLUMN {
        return "$table->softDeletes()".to_string();
    }

    let name = quote(&column.name);
    let format = column.format.as_deref();

    let mut definition = match column.data_type.as_str() {
        "integer" if format == Some("int64") => format!("$table->bigInteger({})", name),
        "integer" => format!("$table->integer({})", name),
        "number" if format == Some("float") => format!("$table->float({})", name),
        "number" => format!("$table->double({})", name),
        "boolean" => format!("$table->boolean({})", name),
        "array" | "object" => format!("$table->json({})", name),
        _ if format == Some("date") => format!("$table->date({})", name),
        _ if format == Some("date-time") => format!("$table->dateTime({})", name),
        _ if !column.enum_values.is_empty() => format!(
            "$table->enum({}, [{}])",
            name,
            column
                .enum_values
                .iter()
                .map(|v| quote(v))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        _ => match column.max_length {
            Some(length) => format!("$table->string({}, {})", name, length),
            None => format!("$table->string({})", name),
        },
    };

    if !column.required {
        definition.push_str("->nullable()");
    }
    if let Some(default) = column.default.as_ref().and_then(default_literal) {
        definition.push_str(&format!("->default({})", default));
    }

    definition
}

fn default_literal(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(quote(s)),
        other => Some(quote(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::context::GenerateOptions;
    use crate::fs::OsFileStore;
    use crate::ir::TypeMap;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    fn column(schema: serde_json::Value) -> PropertyDef {
        TypeDefinition::from_schema("X", &json!({ "properties": { "c": schema } }))
            .properties
            .remove(0)
    }

    fn post() -> TypeDefinition {
        TypeDefinition::from_schema(
            "Post",
            &json!({
                "type": "object",
                "required": ["title"],
                "properties": {
                    "title": { "type": "string", "maxLength": 255 },
                    "views": { "type": "integer", "default": 0 },
                    "deleted_at": { "type": "string", "format": "date-time" }
                }
            }),
        )
    }

    #[test]
    fn test_column_definitions() {
        assert_eq!(
            column_statement(&column(json!({ "type": "integer", "format": "int64" }))),
            "$table->bigInteger('c')->nullable();"
        );
        assert_eq!(
            column_statement(&column(json!({ "type": "string", "enum": ["a", "b"] }))),
            "$table->enum('c', ['a', 'b'])->nullable();"
        );
        assert_eq!(
            column_statement(&column(json!({ "type": "boolean", "default": true }))),
            "$table->boolean('c')->nullable()->default(true);"
        );
    }

    #[test]
    fn test_create_table() {
        let text = create_table_unit(&post()).render();

        assert!(text.contains("class CreatePostTable extends Migration"));
        assert!(text.contains("        Schema::create('post', function (Blueprint $table) {"));
        assert!(text.contains("            $table->bigIncrements('id');"));
        assert!(text.contains("            $table->string('title', 255);"));
        assert!(text.contains("            $table->integer('views')->nullable()->default(0);"));
        assert!(text.contains("            $table->softDeletes();"));
        assert!(text.contains("        Schema::dropIfExists('post');"));
    }

    #[test]
    fn test_create_migration_path_reuses_existing() {
        let dir = TempDir::new().unwrap();
        let types = TypeMap::new();
        let options = GenerateOptions::default();
        let config = GeneratorConfig::with_output_dir(dir.path());
        let ctx = GenerationContext {
            types: &types,
            options: &options,
            config: &config,
            version: "v1",
            diff: None,
            generated_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(18, 45, 12)
                .unwrap(),
        };

        let (fresh, existed) = create_migration_path(&ctx, &OsFileStore, "post").unwrap();
        assert!(!existed);
        assert!(fresh.ends_with("2024_05_01_184512_create_post_table.php"));

        let earlier = config
            .migrations_path("v1")
            .join("2023_01_01_000000_create_post_table.php");
        OsFileStore.write(&earlier, "<?php\n").unwrap();

        let (reused, existed) = create_migration_path(&ctx, &OsFileStore, "post").unwrap();
        assert!(existed);
        assert_eq!(reused, earlier);
    }

    #[test]
    fn test_alter_table_from_changes() {
        let types = TypeMap::new();
        let options = GenerateOptions::default();
        let config = GeneratorConfig::default();
        let ctx = GenerationContext {
            types: &types,
            options: &options,
            config: &config,
            version: "v1",
            diff: None,
            generated_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        };
        let changes = vec![
            PropertyChange::Added {
                column: column(json!({ "type": "string" })),
            },
            PropertyChange::TypeChanged {
                old_column: column(json!({ "type": "integer" })),
                new_column: column(json!({ "type": "integer", "format": "int64" })),
            },
        ];

        assert!(alter_table_unit(&ctx, &post(), &[]).is_none());
        let text = alter_table_unit(&ctx, &post(), &changes).unwrap().render();

        assert!(text.contains("class AlterPostTable20240501090000 extends Migration"));
        assert!(text.contains("            $table->string('c')->nullable();"));
        assert!(text.contains("            $table->bigInteger('c')->nullable()->change();"));
        assert!(text.contains("            $table->dropColumn('c');"));
        assert!(text.contains("            $table->integer('c')->nullable()->change();"));
    }
}
