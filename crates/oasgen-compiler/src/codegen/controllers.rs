//! Controller classes.
//!
//! Each module gets a `DefaultController` extending the configured base
//! controller; entity controllers extend it and start out empty.

use super::assembler::{AssemblyUnit, CodeAssembler};
use super::naming::class_basename;
use crate::context::GenerationContext;

/// Name of the per-module parent controller.
pub const DEFAULT_CONTROLLER: &str = "DefaultController";

/// Controller class name of an entity.
pub fn controller_name(entity: &str) -> String {
    format!("{}Controller", entity)
}

pub fn default_controller_unit(ctx: &GenerationContext<'_>) -> AssemblyUnit {
    let base = &ctx.config.base_controller;

    let mut asm = CodeAssembler::new();
    asm.namespace(ctx.config.namespace_for(ctx.version, &ctx.config.controllers_dir))
        .use_decl(base.as_str())
        .start_class(DEFAULT_CONTROLLER, Some(class_basename(base)));
    asm.finish()
}

pub fn controller_unit(ctx: &GenerationContext<'_>, entity: &str) -> AssemblyUnit {
    let mut asm = CodeAssembler::new();
    asm.namespace(ctx.config.namespace_for(ctx.version, &ctx.config.controllers_dir))
        .start_class(controller_name(entity), Some(DEFAULT_CONTROLLER));
    asm.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::context::GenerateOptions;
    use crate::ir::TypeMap;
    use chrono::NaiveDateTime;

    #[test]
    fn test_controllers() {
        let types = TypeMap::new();
        let options = GenerateOptions::default();
        let config = GeneratorConfig::default();
        let ctx = GenerationContext {
            types: &types,
            options: &options,
            config: &config,
            version: "v2",
            diff: None,
            generated_at: NaiveDateTime::default(),
        };

        let default = default_controller_unit(&ctx).render();
        assert!(default.contains("namespace Modules\\V2\\Http\\Controllers;"));
        assert!(default.contains("use Oasgen\\Extension\\ApiController;"));
        assert!(default.contains("class DefaultController extends ApiController"));

        let post = controller_unit(&ctx, "Post").render();
        assert!(post.contains("class PostController extends DefaultController"));
        assert!(!post.contains("use "));
    }
}
