use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::config::KeyMapping;
use crate::model::{NormalizedIdentifier, PrimaryRecord, SecondaryRecord};

/// A primary record with the secondary record it was paired with, if any.
pub type MatchedPair<'a> = (&'a PrimaryRecord, Option<&'a SecondaryRecord>);

/// Pairs every primary record, in input order, with the first secondary
/// record sharing its normalized identifier.
///
/// Duplicate identifiers among the secondaries resolve to the first
/// occurrence. Records without an identifier on either side never pair.
pub fn match_records<'a>(
    primaries: &'a [PrimaryRecord],
    secondaries: &'a [SecondaryRecord],
    key: KeyMapping,
) -> Vec<MatchedPair<'a>> {
    let index = index_secondaries(secondaries, key);

    primaries
        .iter()
        .map(|primary| {
            let secondary = primary
                .identifier(key.primary)
                .and_then(|identifier| index.get(&identifier).copied());
            (primary, secondary)
        })
        .collect()
}

fn index_secondaries(
    secondaries: &[SecondaryRecord],
    key: KeyMapping,
) -> HashMap<NormalizedIdentifier, &SecondaryRecord> {
    let mut index = HashMap::with_capacity(secondaries.len());
    for (position, secondary) in secondaries.iter().enumerate() {
        let Some(identifier) = secondary.identifier(key.secondary) else {
            continue;
        };
        match index.entry(identifier) {
            Entry::Vacant(slot) => {
                slot.insert(secondary);
            }
            Entry::Occupied(slot) => {
                debug!(
                    identifier = slot.key().as_str(),
                    row = position,
                    "duplicate secondary identifier ignored, first occurrence wins"
                );
            }
        }
    }
    index
}
