//! Merge policy.
//!
//! Pure functions over source payloads: ordered shallow merge for the
//! premium-first strategy and the per-section presentation view for the
//! all-parallel strategy. Neither step fills in defaults; absence is
//! preserved all the way to the report.

use std::cmp::Reverse;

use crate::types::{is_truthy, MergedRecord, PartitionedRecord, SourcePayload, SourceRole, SourceSection};

/// Where compliance flags are read from, best first.
const FLAG_ROLES: [SourceRole; 3] = [SourceRole::Compliance, SourceRole::Premium, SourceRole::Person];

/// Where owner and related-person data is read from, best first.
const PEOPLE_ROLES: [SourceRole; 3] = [SourceRole::Person, SourceRole::Premium, SourceRole::Compliance];

/// Shallow-merge payloads given in ascending precedence: on a key
/// collision the later payload wins.
pub fn merge_ordered<I>(payloads: I) -> SourcePayload
where
    I: IntoIterator<Item = SourcePayload>,
{
    payloads
        .into_iter()
        .fold(SourcePayload::default(), |mut merged, next| {
            merged.absorb(next);
            merged
        })
}

/// Total non-null fields across every section. A truthy `error`
/// marker is not content.
pub fn populated_fields(parts: &PartitionedRecord) -> usize {
    parts
        .sections
        .iter()
        .filter_map(|s| s.record.as_ref())
        .map(|r| {
            let flagged = r.extra.get("error").is_some_and(is_truthy);
            r.to_value().as_object().map_or(0, |o| o.len()) - usize::from(flagged)
        })
        .sum()
}

/// Build the single record the report reads from an all-parallel result.
///
/// Compliance flags come from the compliance section, owner and
/// related-person data from the person section. When that section lacks
/// the data, the premium section is consulted, then the rest. Within a
/// role, higher rank is consulted first.
pub fn compose_view(parts: &PartitionedRecord) -> MergedRecord {
    let flags = by_preference(parts, &FLAG_ROLES);
    let people = by_preference(parts, &PEOPLE_ROLES);

    let owner_source = people.iter().find(|r| r.primary_owner().is_some());
    let related_source = people.iter().find(|r| !r.related_names().is_empty());

    let mut extra = serde_json::Map::new();
    for record in parts.sections.iter().filter_map(|s| s.record.as_ref()) {
        extra.extend(record.extra.clone());
    }

    MergedRecord {
        phone: first_of(&flags, |r| r.phone.as_ref()),
        state: first_of(&flags, |r| r.state.as_ref()),
        ndnc: first_of(&flags, |r| r.ndnc.as_ref()),
        sdnc: first_of(&flags, |r| r.sdnc.as_ref()),
        litigator: first_of(&flags, |r| r.litigator.as_ref()),
        blacklist: first_of(&flags, |r| r.blacklist.as_ref()),
        owner: owner_source.and_then(|r| r.owner.clone()),
        owners: owner_source.and_then(|r| r.owners.clone()),
        related_persons: related_source.and_then(|r| r.related_persons.clone()),
        related: related_source.and_then(|r| r.related.clone()),
        extra,
    }
}

fn by_preference<'a>(parts: &'a PartitionedRecord, roles: &[SourceRole]) -> Vec<&'a MergedRecord> {
    let mut sections: Vec<&SourceSection> = parts.sections.iter().filter(|s| s.record.is_some()).collect();
    sections.sort_by_key(|s| {
        let preference = roles.iter().position(|r| *r == s.role).unwrap_or(roles.len());
        (preference, Reverse(s.rank), s.source.clone())
    });
    sections.into_iter().filter_map(|s| s.record.as_ref()).collect()
}

fn first_of<T, F>(records: &[&MergedRecord], field: F) -> Option<T>
where
    T: Clone,
    F: Fn(&MergedRecord) -> Option<&T>,
{
    records.iter().find_map(|r| field(r)).cloned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
