//! Cardinality inference between two types.
//!
//! Everything here is a pure function over parsed [`RelationRef`] tokens, so
//! the rules can be exercised without building schema documents.

use crate::diagnostic::GenError;
use crate::ir::{Cardinality, RelationEdge, RelationRef};

/// Infers the edge from `owner` to `candidate`.
///
/// Both sides must reference each other for an edge to exist; a one-sided
/// reference yields `Ok(None)`. A side that names the other both with and
/// without the many marker cannot be classified and is reported as
/// [`GenError::RelationAmbiguity`].
pub fn resolve(
    owner: &str,
    candidate: &str,
    owner_refs: &[RelationRef],
    candidate_refs: &[RelationRef],
) -> Result<Option<RelationEdge>, GenError> {
    let Some(owner_many) = side_marker(owner, candidate, owner_refs)? else {
        return Ok(None);
    };
    let Some(candidate_many) = side_marker(candidate, owner, candidate_refs)? else {
        return Ok(None);
    };

    let cardinality = Cardinality::from_markers(owner_many, candidate_many);
    let pivot = (cardinality == Cardinality::ManyToMany).then(|| pivot_name(owner, candidate));

    Ok(Some(RelationEdge {
        source: owner.to_string(),
        target: candidate.to_string(),
        cardinality,
        pivot,
    }))
}

/// Many marker of the references from `side` to `other`, or `None` when
/// `side` does not reference `other` at all.
fn side_marker(side: &str, other: &str, refs: &[RelationRef]) -> Result<Option<bool>, GenError> {
    let mut markers = refs.iter().filter(|r| r.target == other).map(|r| r.many);

    let Some(first) = markers.next() else {
        return Ok(None);
    };

    if markers.any(|many| many != first) {
        return Err(GenError::RelationAmbiguity {
            owner: side.to_string(),
            target: other.to_string(),
            reason: "declared both as a single and as a many reference".to_string(),
        });
    }

    Ok(Some(first))
}

/// Pivot class name of a many-to-many pair; identical for `(a, b)` and `(b, a)`.
pub fn pivot_name(a: &str, b: &str) -> String {
    let (first, second) = canonical_pair(a, b);
    format!("{}{}", first, second)
}

/// Orders a pair lexicographically.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(tokens: &[&str]) -> Vec<RelationRef> {
        tokens.iter().filter_map(|t| RelationRef::parse(t)).collect()
    }

    #[test]
    fn test_single_reference_on_both_sides_is_one_to_one() {
        let edge = resolve("User", "Profile", &refs(&["Profile"]), &refs(&["User"]))
            .unwrap()
            .unwrap();
        assert_eq!(edge.cardinality, Cardinality::OneToOne);
        assert_eq!(edge.pivot, None);
    }

    #[test]
    fn test_owner_many_is_has_many() {
        let edge = resolve("User", "Post", &refs(&["Post[]"]), &refs(&["User"]))
            .unwrap()
            .unwrap();
        assert_eq!(edge.cardinality, Cardinality::ManyToOne);
        assert_eq!(edge.cardinality.accessor(), "hasMany");
    }

    #[test]
    fn test_candidate_many_is_belongs_to() {
        // Post -> User is single, User -> Post is many: Post belongs to User.
        let edge = resolve("Post", "User", &refs(&["User"]), &refs(&["Post[]"]))
            .unwrap()
            .unwrap();
        assert_eq!(edge.cardinality, Cardinality::OneToMany);
        assert_eq!(edge.cardinality.accessor(), "belongsTo");
        assert_eq!(edge.source, "Post");
    }

    #[test]
    fn test_both_many_gets_commutative_pivot() {
        let forward = resolve("Tag", "Post", &refs(&["Post[]"]), &refs(&["Tag[]"]))
            .unwrap()
            .unwrap();
        let backward = resolve("Post", "Tag", &refs(&["Tag[]"]), &refs(&["Post[]"]))
            .unwrap()
            .unwrap();

        assert_eq!(forward.cardinality, Cardinality::ManyToMany);
        assert_eq!(forward.pivot.as_deref(), Some("PostTag"));
        assert_eq!(backward.pivot, forward.pivot);
    }

    #[test]
    fn test_one_sided_reference_has_no_edge() {
        assert_eq!(resolve("Post", "User", &refs(&["User"]), &refs(&[])).unwrap(), None);
        assert_eq!(resolve("Post", "User", &refs(&[]), &refs(&["Post[]"])).unwrap(), None);
    }

    #[test]
    fn test_name_containment_is_not_a_match() {
        // `PostTag` contains `Post` but is a different type.
        assert_eq!(
            resolve("Post", "User", &refs(&["User"]), &refs(&["PostTag[]"])).unwrap(),
            None
        );
    }

    #[test]
    fn test_mixed_markers_are_ambiguous() {
        let err = resolve("Post", "User", &refs(&["User", "User[]"]), &refs(&["Post"])).unwrap_err();
        assert!(matches!(err, GenError::RelationAmbiguity { ref owner, .. } if owner == "Post"));
    }

    #[test]
    fn test_pivot_naming() {
        assert_eq!(pivot_name("Topic", "Article"), "ArticleTopic");
        assert_eq!(canonical_pair("b", "a"), ("a", "b"));
    }
}
