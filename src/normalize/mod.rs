//! Turns raw rows into typed records.
//!
//! Nothing in here fails: an empty identifier or a stock cell that is not an
//! integer degrades to "no identifier" or zero and the row is kept.

use std::collections::BTreeMap;
use std::num::IntErrorKind;

use tracing::debug;

use crate::config::{PrimaryProfile, SecondaryProfile, StockLayout};
use crate::model::{NormalizedIdentifier, PrimaryRecord, RawRow, SecondaryRecord, StockCell};

/// Lowercases and trims an identifier; `None` if nothing is left.
pub fn normalize_identifier(raw: &str) -> Option<NormalizedIdentifier> {
    NormalizedIdentifier::parse(raw)
}

/// Classifies a stock cell. Sentinels are compared case-insensitively.
pub fn classify_stock(raw: Option<&str>, sentinels: &[String]) -> StockCell {
    let Some(text) = raw.map(str::trim) else {
        return StockCell::Missing;
    };
    if text.is_empty() {
        return StockCell::Missing;
    }
    if sentinels
        .iter()
        .any(|sentinel| sentinel.trim().eq_ignore_ascii_case(text))
    {
        return StockCell::NotTracked;
    }
    match text.parse::<i128>() {
        Ok(value) => StockCell::Quantity(u64::try_from(value.max(0)).unwrap_or(u64::MAX)),
        Err(error) => match error.kind() {
            IntErrorKind::PosOverflow => StockCell::Quantity(u64::MAX),
            IntErrorKind::NegOverflow => StockCell::Quantity(0),
            _ => StockCell::Invalid(text.to_string()),
        },
    }
}

/// Total stock rule: missing, sentinel, or unparsable text is zero, negative
/// numbers clamp to zero and integers past `u64::MAX` clamp to it.
pub fn parse_stock(raw: Option<&str>, sentinels: &[String]) -> u64 {
    classify_stock(raw, sentinels).quantity()
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn cell(row: &RawRow, column: &str) -> String {
    row.get(column).map(str::trim).unwrap_or_default().to_string()
}

fn optional_cell(row: &RawRow, column: Option<&String>) -> String {
    column.map(|column| cell(row, column)).unwrap_or_default()
}

/// Builds a primary record, gating stock on the availability flag when the
/// profile names one and the row carries it.
pub fn normalize_primary(
    row: &RawRow,
    profile: &PrimaryProfile,
    sentinels: &[String],
) -> PrimaryRecord {
    let stock = classify_stock(row.get(&profile.stock), sentinels);
    if let StockCell::Invalid(text) = &stock {
        debug!(column = %profile.stock, value = %text, "unparsable primary stock, using 0");
    }

    let in_stock = profile
        .in_stock
        .as_deref()
        .and_then(|column| row.get(column))
        .map(is_truthy);

    let stock_quantity = match in_stock {
        Some(false) => 0,
        Some(true) | None => stock.quantity(),
    };

    PrimaryRecord {
        name: cell(row, &profile.name),
        sku: cell(row, &profile.sku),
        barcode: optional_cell(row, profile.barcode.as_ref()),
        in_stock,
        stock_quantity,
    }
}

/// Builds a secondary record, reading either the on-hand column or every
/// configured location column.
pub fn normalize_secondary(
    row: &RawRow,
    profile: &SecondaryProfile,
    sentinels: &[String],
) -> SecondaryRecord {
    let mut sku = cell(row, &profile.sku);
    if sku.is_empty() {
        sku = optional_cell(row, profile.sku_fallback.as_ref());
    }

    let (on_hand, per_location) = match &profile.stock {
        StockLayout::OnHand { column } => {
            (classify_stock(row.get(column), sentinels), BTreeMap::new())
        }
        StockLayout::Locations { names } => {
            let cells = names
                .iter()
                .map(|name| (name.clone(), classify_stock(row.get(name), sentinels)))
                .collect();
            (StockCell::Missing, cells)
        }
    };

    SecondaryRecord {
        name: cell(row, &profile.title),
        sku,
        barcode: optional_cell(row, profile.barcode.as_ref()),
        variant_label: cell(row, &profile.variant),
        on_hand,
        per_location,
    }
}
