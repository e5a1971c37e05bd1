//! Relationship resolution.
//!
//! Turns the relation references declared on each type into
//! [`RelationEdge`]s and decides which type owns each many-to-many pivot.

mod pivots;
mod resolver;

pub use pivots::{PivotPlan, PivotRegistry, CLASS_EXTENSION};
pub use resolver::{canonical_pair, pivot_name, resolve};

use tracing::debug;

use crate::diagnostic::GenError;
use crate::ir::{RelationEdge, TypeDefinition, TypeMap};

/// Edges of `owner` in declaration order.
///
/// References that cannot be resolved are returned as errors next to the
/// edges that could; the caller logs them and carries on.
pub fn relations_for(owner: &TypeDefinition, types: &TypeMap) -> (Vec<RelationEdge>, Vec<GenError>) {
    let mut edges: Vec<RelationEdge> = Vec::new();
    let mut errors = Vec::new();

    for reference in &owner.relations {
        if edges.iter().any(|e| e.target == reference.target) {
            continue;
        }

        let Some(candidate) = types.get(&reference.target) else {
            errors.push(GenError::RelationAmbiguity {
                owner: owner.name.clone(),
                target: reference.target.clone(),
                reason: "referenced type is not declared".to_string(),
            });
            continue;
        };

        match resolve(&owner.name, &candidate.name, &owner.relations, &candidate.relations) {
            Ok(Some(edge)) => edges.push(edge),
            Ok(None) => {
                debug!(owner = %owner.name, target = %candidate.name, "no back-reference, no relation");
            }
            Err(err) => {
                if !errors.iter().any(|e: &GenError| e.to_string() == err.to_string()) {
                    errors.push(err);
                }
            }
        }
    }

    (edges, errors)
}
