//! Form request classes: one public property per column, validation rules
//! derived from column declarations and the list of related types.

use super::assembler::{quote, AssemblyUnit, CodeAssembler, MethodDecl, PropertyDecl, Visibility};
use super::naming::{class_basename, lcfirst, to_php_type};
use crate::context::GenerationContext;
use crate::ir::{PropertyDef, TypeDefinition};

/// Form request class name of an entity.
pub fn form_request_name(entity: &str) -> String {
    format!("{}FormRequest", entity)
}

pub fn form_request_unit(ctx: &GenerationContext<'_>, def: &TypeDefinition) -> AssemblyUnit {
    let base = &ctx.config.base_form_request;

    let mut asm = CodeAssembler::new();
    asm.namespace(ctx.config.namespace_for(ctx.version, &ctx.config.form_request_dir))
        .use_decl(base.as_str())
        .start_class(form_request_name(&def.name), Some(class_basename(base)))
        .property(PropertyDecl::new(Visibility::Public, "id").with_default("null"));

    for column in def.columns.iter().filter(|c| c.name != "id") {
        asm.property(
            PropertyDecl::new(Visibility::Public, column.name.as_str())
                .with_type(format!("?{}", to_php_type(column)))
                .with_default("null"),
        );
    }

    asm.start_method(MethodDecl::new(Visibility::Public, "rules").with_return_type("array"))
        .body_line("return [");
    for column in &def.columns {
        asm.body_line(format!("    {} => {},", quote(&column.name), quote(&validation_rule(column))));
    }
    asm.body_line("];");

    asm.start_method(MethodDecl::new(Visibility::Public, "relations").with_return_type("array"))
        .body_line("return [");
    for relation in &def.relations {
        asm.body_line(format!("    {},", quote(&lcfirst(&relation.target))));
    }
    asm.body_line("];");

    asm.finish()
}

/// Validation rule of a column, e.g. `required|string|max:255`.
pub fn validation_rule(column: &PropertyDef) -> String {
    let mut parts = vec![if column.required { "required" } else { "nullable" }.to_string()];

    let kind = match (column.data_type.as_str(), column.format.as_deref()) {
        ("integer", _) => "integer",
        ("number", _) => "numeric",
        ("boolean", _) => "boolean",
        ("array", _) | ("object", _) => "array",
        (_, Some("date")) | (_, Some("date-time")) => "date",
        _ => "string",
    };
    parts.push(kind.to_string());

    if let Some(length) = column.max_length {
        parts.push(format!("max:{}", length));
    }
    if !column.enum_values.is_empty() {
        parts.push(format!("in:{}", column.enum_values.join(",")));
    }

    parts.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::context::GenerateOptions;
    use crate::ir::TypeMap;
    use chrono::NaiveDateTime;
    use serde_json::json;

    #[test]
    fn test_form_request() {
        let def = TypeDefinition::from_schema(
            "Post",
            &json!({
                "type": "object",
                "required": ["title"],
                "properties": {
                    "title": { "type": "string", "maxLength": 255 },
                    "status": { "type": "string", "enum": ["draft", "published"] },
                    "relationships": { "type": "User | Tag[]" }
                }
            }),
        );
        let types = TypeMap::new();
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

        let text = form_request_unit(&ctx, &def).render();

        assert!(text.contains("namespace Modules\\V1\\Http\\Requests;"));
        assert!(text.contains("class PostFormRequest extends BaseFormRequest"));
        assert!(text.contains("    public $id = null;\n    public ?string $title = null;\n    public ?string $status = null;"));
        assert!(text.contains("    public function rules(): array"));
        assert!(text.contains("            'title' => 'required|string|max:255',"));
        assert!(text.contains("            'status' => 'nullable|string|in:draft,published',"));
        assert!(text.contains("            'user',\n            'tag',"));
    }
}
