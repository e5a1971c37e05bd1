//! Entity and pivot classes.

use super::assembler::{quote, AssemblyUnit, CodeAssembler, MethodDecl, PropertyDecl, Visibility};
use super::naming::{class_basename, lcfirst, table_name};
use crate::context::GenerationContext;
use crate::ir::{Cardinality, RelationEdge, TypeDefinition, CUSTOM_TYPE_ID, SOFT_DELETE_COLUMN};
use crate::relation::PivotPlan;

/// Fully-qualified soft-delete trait.
pub const SOFT_DELETES_TRAIT: &str = "Illuminate\\Database\\Eloquent\\SoftDeletes";

/// A relation accessor to emit, with the pivot plan of many-to-many edges.
#[derive(Debug, Clone)]
pub struct Accessor<'a> {
    pub edge: &'a RelationEdge,
    pub pivot: Option<&'a PivotPlan>,
}

impl Accessor<'_> {
    fn expression(&self) -> String {
        let call = self.edge.cardinality.accessor();
        match (self.edge.cardinality, self.pivot) {
            (Cardinality::ManyToMany, Some(pivot)) => format!(
                "return $this->{}({}::class, {});",
                call,
                self.edge.target,
                quote(&pivot.table())
            ),
            _ => format!("return $this->{}({}::class);", call, self.edge.target),
        }
    }
}

/// Builds the entity class of `def`.
pub fn entity_unit(ctx: &GenerationContext<'_>, def: &TypeDefinition, accessors: &[Accessor<'_>]) -> AssemblyUnit {
    let base_model = &ctx.config.base_model;
    let soft_delete = def.is_soft_delete();

    let mut asm = CodeAssembler::new();
    asm.namespace(ctx.config.namespace_for(ctx.version, &ctx.config.entities_dir));
    if soft_delete {
        asm.use_decl(SOFT_DELETES_TRAIT);
    }
    asm.use_decl(base_model.as_str())
        .start_class(def.name.as_str(), Some(class_basename(base_model)));

    if soft_delete {
        asm.use_trait(class_basename(SOFT_DELETES_TRAIT)).property(
            PropertyDecl::new(Visibility::Protected, "dates")
                .with_default(format!("[{}]", quote(SOFT_DELETE_COLUMN))),
        );
    }

    asm.property(
        PropertyDecl::new(Visibility::Protected, "primaryKey")
            .with_default(quote(&CUSTOM_TYPE_ID.to_lowercase())),
    )
    .property(PropertyDecl::new(Visibility::Protected, "table").with_default(quote(&table_name(&def.name))))
    .property(PropertyDecl::new(Visibility::Public, "timestamps").with_default("false"));

    for accessor in accessors {
        asm.start_method(MethodDecl::new(Visibility::Public, lcfirst(&accessor.edge.target)))
            .body_line(accessor.expression())
            .end_method();
    }

    asm.finish()
}

/// Builds the pivot class of a many-to-many pair.
pub fn pivot_unit(ctx: &GenerationContext<'_>, plan: &PivotPlan) -> AssemblyUnit {
    let base_model = &ctx.config.base_model;

    let mut asm = CodeAssembler::new();
    asm.namespace(ctx.config.namespace_for(ctx.version, &ctx.config.entities_dir))
        .use_decl(base_model.as_str())
        .start_class(plan.class_name(), Some(class_basename(base_model)))
        .property(
            PropertyDecl::new(Visibility::Protected, "primaryKey")
                .with_default(quote(&CUSTOM_TYPE_ID.to_lowercase())),
        )
        .property(PropertyDecl::new(Visibility::Protected, "table").with_default(quote(&plan.table())))
        .property(PropertyDecl::new(Visibility::Public, "timestamps").with_default("true"));

    asm.finish()
}
