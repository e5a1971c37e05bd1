//! Relation references and derived relation edges.

use super::strip_schema_ref;

/// Suffix marking a "many" reference.
pub const MANY_MARKER: &str = "[]";

/// Suffix of support types holding relationship envelopes.
const RELATIONSHIPS_SUFFIX: &str = "Relationships";

/// One parsed relation reference, e.g. `Post[]` (many) or `User` (one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRef {
    /// Referenced type name.
    pub target: String,
    /// Whether the reference carries the many marker.
    pub many: bool,
}

impl RelationRef {
    pub fn new(target: impl Into<String>, many: bool) -> Self {
        Self {
            target: target.into(),
            many,
        }
    }

    /// Parses a single reference token.
    ///
    /// Accepts the in-document `$ref` prefix and the `Relationships` suffix
    /// of relationship envelope types, so `#/components/schemas/TagRelationships[]`
    /// and `Tag[]` parse to the same reference. Returns `None` for blank tokens.
    pub fn parse(token: &str) -> Option<Self> {
        let token = strip_schema_ref(token.trim());
        let (name, many) = match token.strip_suffix(MANY_MARKER) {
            Some(name) => (name.trim_end(), true),
            None => (token, false),
        };
        let name = match name.strip_suffix(RELATIONSHIPS_SUFFIX) {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => name,
        };

        if name.is_empty() {
            return None;
        }

        Some(Self::new(name, many))
    }

    /// Parses a `|`-separated declaration, preserving order.
    pub fn parse_list(declaration: &str) -> Vec<Self> {
        declaration.split('|').filter_map(Self::parse).collect()
    }
}

/// Multiplicity between an owner type and a related type, seen from the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Neither side is many.
    OneToOne,
    /// The owner holds many of the related type.
    ManyToOne,
    /// Inverse side: the owner belongs to a related type that holds many.
    OneToMany,
    /// Both sides are many; joined through a pivot.
    ManyToMany,
}

impl Cardinality {
    /// Classifies from the many markers on each side.
    pub fn from_markers(owner_many: bool, candidate_many: bool) -> Self {
        match (owner_many, candidate_many) {
            (false, false) => Cardinality::OneToOne,
            (true, false) => Cardinality::ManyToOne,
            (false, true) => Cardinality::OneToMany,
            (true, true) => Cardinality::ManyToMany,
        }
    }

    /// Relation-building call used by the generated accessor.
    pub fn accessor(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "hasOne",
            Cardinality::ManyToOne => "hasMany",
            Cardinality::OneToMany => "belongsTo",
            Cardinality::ManyToMany => "belongsToMany",
        }
    }
}

/// A resolved relation between two types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEdge {
    pub source: String,
    pub target: String,
    pub cardinality: Cardinality,
    /// Pivot class name, only for [`Cardinality::ManyToMany`].
    pub pivot: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!(RelationRef::parse("Post[]"), Some(RelationRef::new("Post", true)));
        assert_eq!(RelationRef::parse(" User "), Some(RelationRef::new("User", false)));
        assert_eq!(
            RelationRef::parse("#/components/schemas/TagRelationships[]"),
            Some(RelationRef::new("Tag", true))
        );
        assert_eq!(
            RelationRef::parse("Relationships"),
            Some(RelationRef::new("Relationships", false))
        );
        assert_eq!(RelationRef::parse("   "), None);
    }

    #[test]
    fn test_parse_list_keeps_order() {
        let refs = RelationRef::parse_list("Tag[] | Topic |");
        assert_eq!(
            refs,
            vec![RelationRef::new("Tag", true), RelationRef::new("Topic", false)]
        );
    }

    #[test]
    fn test_cardinality_table() {
        assert_eq!(Cardinality::from_markers(false, false), Cardinality::OneToOne);
        assert_eq!(Cardinality::from_markers(true, false), Cardinality::ManyToOne);
        assert_eq!(Cardinality::from_markers(false, true), Cardinality::OneToMany);
        assert_eq!(Cardinality::from_markers(true, true), Cardinality::ManyToMany);
        assert_eq!(Cardinality::OneToMany.accessor(), "belongsTo");
    }
}
