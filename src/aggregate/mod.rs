use crate::config::KeyMapping;
use crate::model::{MergedRecord, PrimaryRecord, SecondaryRecord, StockCell};

/// Combines a primary record with its (optional) secondary counterpart.
///
/// With `locations`, each named location is looked up on the secondary
/// record and summed; otherwise the on-hand cell is the secondary total.
/// An absent secondary contributes zero everywhere. Totals saturate at
/// `u64::MAX`.
pub fn aggregate(
    primary: &PrimaryRecord,
    secondary: Option<&SecondaryRecord>,
    locations: Option<&[String]>,
    key: KeyMapping,
) -> MergedRecord {
    let per_location = locations.map(|names| {
        names
            .iter()
            .map(|name| {
                let quantity = secondary
                    .and_then(|record| record.per_location.get(name))
                    .map(StockCell::quantity)
                    .unwrap_or(0);
                (name.clone(), quantity)
            })
            .collect::<Vec<_>>()
    });

    let secondary_stock_total: u64 = match (&per_location, secondary) {
        (Some(cells), _) => cells
            .iter()
            .fold(0u64, |total, (_, quantity)| total.saturating_add(*quantity)),
        (None, Some(record)) => record.on_hand.quantity(),
        (None, None) => 0,
    };

    MergedRecord {
        primary_name: primary.name.clone(),
        secondary_name: secondary.map(|record| record.name.clone()),
        variant_label: secondary.map(|record| record.variant_label.clone()),
        primary_stock: primary.stock_quantity,
        per_location,
        secondary_stock_total,
        combined_total: primary.stock_quantity.saturating_add(secondary_stock_total),
        primary_identifier: primary.identifier_text(key.primary).to_string(),
        secondary_identifier: secondary
            .map(|record| record.identifier_text(key.secondary).to_string()),
    }
}
