//! Functional test stubs exercising the generated endpoints.

use super::assembler::{quote, AssemblyUnit, CodeAssembler, MethodDecl, Visibility};
use super::naming::table_name;
use crate::context::GenerationContext;
use crate::ir::{PropertyDef, TypeDefinition};

const TESTER: &str = "FunctionalTester";

/// Test class name of an entity.
pub fn cest_name(entity: &str) -> String {
    format!("{}Cest", entity)
}

pub fn cest_unit(ctx: &GenerationContext<'_>, def: &TypeDefinition) -> AssemblyUnit {
    let route = format!("/{}/{}", ctx.version, table_name(&def.name));
    let param = format!("{} $I", TESTER);

    let mut asm = CodeAssembler::new();
    asm.use_decl(TESTER).start_class(cest_name(&def.name), None);

    asm.start_method(MethodDecl::new(Visibility::Public, "tryToTestIndex").with_params([param.as_str()]))
        .body_line(format!("$I->sendGET({});", quote(&route)))
        .body_line("$I->seeResponseCodeIs(200);");

    asm.start_method(MethodDecl::new(Visibility::Public, "tryToTestView").with_params([param.as_str()]))
        .body_line(format!("$I->sendGET({});", quote(&format!("{}/1", route))))
        .body_line("$I->seeResponseCodeIs(200);");

    asm.start_method(MethodDecl::new(Visibility::Public, "tryToTestCreate").with_params([param.as_str()]))
        .body_line(format!("$I->sendPOST({}, [", quote(&route)))
        .body_line("    'data' => [")
        .body_line(format!("        'type' => {},", quote(&table_name(&def.name))))
        .body_line("        'attributes' => [");
    for column in def.columns.iter().filter(|c| c.name != "id") {
        asm.body_line(format!("            {} => {},", quote(&column.name), sample_value(column)));
    }
    asm.body_line("        ],")
        .body_line("    ],")
        .body_line("]);")
        .body_line("$I->seeResponseCodeIs(201);");

    asm.start_method(MethodDecl::new(Visibility::Public, "tryToTestDelete").with_params([param.as_str()]))
        .body_line(format!("$I->sendDELETE({});", quote(&format!("{}/1", route))))
        .body_line("$I->seeResponseCodeIs(204);");

    asm.finish()
}

fn sample_value(column: &PropertyDef) -> String {
    if let Some(first) = column.enum_values.first() {
        return quote(first);
    }
    match (column.data_type.as_str(), column.format.as_deref()) {
        ("integer", _) => "1".to_string(),
        ("number", _) => "1.5".to_string(),
        ("boolean", _) => "true".to_string(),
        ("array", _) | ("object", _) => "[]".to_string(),
        (_, Some("date")) => quote("2024-01-01"),
        (_, Some("date-time")) => quote("2024-01-01 00:00:00"),
        _ => quote(&column.name),
    }
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
    fn test_cest_routes_and_payload() {
        let def = TypeDefinition::from_schema(
            "Post",
            &json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "views": { "type": "integer" }
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

        let text = cest_unit(&ctx, &def).render();

        assert!(text.contains("use FunctionalTester;"));
        assert!(text.contains("class PostCest\n{"));
        assert!(text.contains("    public function tryToTestIndex(FunctionalTester $I)"));
        assert!(text.contains("        $I->sendGET('/v1/post');"));
        assert!(text.contains("                'title' => 'title',"));
        assert!(text.contains("                'views' => 1,"));
        assert!(text.contains("        $I->sendDELETE('/v1/post/1');"));
    }
}
