//! Per-record-kind collection naming.
//!
//! Memories, checkpoints and remediations are required to live in distinct
//! collections (spec §3) while the collection-name invariant (spec §4.1,
//! §8 property 2) fixes the shape at exactly three `/`-separated parts. The
//! branch segment carries a literal suffix per kind so the three-part shape
//! and `CollectionName::parse` round trip (see `contextd_domain::identity`)
//! are untouched; see `DESIGN.md` for the rationale.

use contextd_domain::entities::MemoryKind;
use contextd_domain::identity::CollectionName;

/// Build the collection name a given record kind lives in, for one
/// owner/project/branch scope.
#[must_use]
pub fn collection_name_for(owner_id: &str, project_id: &str, branch: &str, kind: MemoryKind) -> String {
    let branch_segment = match kind {
        MemoryKind::Memory => branch.to_owned(),
        MemoryKind::Checkpoint => format!("{branch}__checkpoint"),
        MemoryKind::Remediation => format!("{branch}__remediation"),
    };
    CollectionName::new(owner_id, project_id, &branch_segment).to_string_name()
}

/// The collection repository documents are indexed into for one
/// owner/project/branch scope. Repository documents are not memory-shaped
/// records, so they get their own branch suffix rather than a `MemoryKind`.
#[must_use]
pub fn repository_collection_name(owner_id: &str, project_id: &str, branch: &str) -> String {
    CollectionName::new(owner_id, project_id, &format!("{branch}__repository")).to_string_name()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_produce_distinct_collections() {
        let memory = collection_name_for("o", "p", "main", MemoryKind::Memory);
        let checkpoint = collection_name_for("o", "p", "main", MemoryKind::Checkpoint);
        let remediation = collection_name_for("o", "p", "main", MemoryKind::Remediation);
        assert_ne!(memory, checkpoint);
        assert_ne!(memory, remediation);
        assert_ne!(checkpoint, remediation);
    }

    #[test]
    fn memory_kind_keeps_plain_three_part_name() {
        let name = collection_name_for("o", "p", "main", MemoryKind::Memory);
        assert_eq!(CollectionName::parse(&name).unwrap().branch, "main");
    }
}
