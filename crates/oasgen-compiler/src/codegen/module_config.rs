//! Per-module configuration file.

use super::assembler::{quote, AssemblyUnit, CodeAssembler};
use crate::config::module_name;
use crate::context::GenerationContext;

/// File name of the module configuration.
pub const CONFIG_FILE: &str = "config.php";

/// Lists the module name and its entities.
pub fn module_config_unit(ctx: &GenerationContext<'_>) -> AssemblyUnit {
    let mut asm = CodeAssembler::new();
    asm.line("return [")
        .line(format!("    'name' => {},", quote(&module_name(ctx.version))))
        .line("    'entities' => [");
    for entity in ctx.entities() {
        asm.line(format!("        {},", quote(&entity.name)));
    }
    asm.line("    ],").line("];");
    asm.finish()
}
