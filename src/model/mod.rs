use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::IdentifierField;

/// One data line of a parsed export: column header → cell text.
///
/// Column order carries no meaning; row order is kept by the containing
/// `Vec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a cell. The first occurrence of a repeated header is kept.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.entry(column.into()).or_insert_with(|| value.into());
    }

    /// Looks up a cell, accepting the header with or without surrounding
    /// double quotes on either side.
    pub fn get(&self, column: &str) -> Option<&str> {
        if let Some(value) = self.cells.get(column) {
            return Some(value.as_str());
        }
        let bare = column.trim_matches('"');
        self.cells
            .get(bare)
            .or_else(|| self.cells.get(&format!("\"{bare}\"")))
            .map(String::as_str)
    }

    /// True when every cell is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|value| value.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// Matching key after trimming and lowercasing. An identifier that is empty
/// after trimming does not exist and therefore can never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedIdentifier(String);

impl NormalizedIdentifier {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Classified stock cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCell {
    /// Column absent or cell empty.
    Missing,
    /// A configured sentinel such as "not stocked".
    NotTracked,
    /// Parsed quantity, already clamped to `0..=u64::MAX`.
    Quantity(u64),
    /// Text that is not an integer.
    Invalid(String),
}

impl StockCell {
    /// Effective quantity; everything but a parsed number counts as zero.
    pub fn quantity(&self) -> u64 {
        match self {
            StockCell::Quantity(value) => *value,
            StockCell::Missing | StockCell::NotTracked | StockCell::Invalid(_) => 0,
        }
    }
}

/// Product line from the primary storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryRecord {
    pub name: String,
    pub sku: String,
    pub barcode: String,
    /// `None` when the export carries no availability flag.
    pub in_stock: Option<bool>,
    pub stock_quantity: u64,
}

impl PrimaryRecord {
    /// Trimmed cell of the chosen identifier column, as it appeared.
    pub fn identifier_text(&self, field: IdentifierField) -> &str {
        match field {
            IdentifierField::Sku => &self.sku,
            IdentifierField::Barcode => &self.barcode,
        }
    }

    pub fn identifier(&self, field: IdentifierField) -> Option<NormalizedIdentifier> {
        NormalizedIdentifier::parse(self.identifier_text(field))
    }
}

/// Variant line from the secondary storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryRecord {
    pub name: String,
    pub sku: String,
    pub barcode: String,
    pub variant_label: String,
    /// Single-column quantity; `Missing` in per-location mode.
    pub on_hand: StockCell,
    /// Per-location cells; empty in single-column mode.
    pub per_location: BTreeMap<String, StockCell>,
}

impl SecondaryRecord {
    pub fn identifier_text(&self, field: IdentifierField) -> &str {
        match field {
            IdentifierField::Sku => &self.sku,
            IdentifierField::Barcode => &self.barcode,
        }
    }

    pub fn identifier(&self, field: IdentifierField) -> Option<NormalizedIdentifier> {
        NormalizedIdentifier::parse(self.identifier_text(field))
    }
}

/// One line of the unified stock report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub primary_name: String,
    /// `None` when no secondary record matched.
    pub secondary_name: Option<String>,
    pub variant_label: Option<String>,
    pub primary_stock: u64,
    /// Location → quantity in configured order; `None` in single-column mode.
    pub per_location: Option<Vec<(String, u64)>>,
    pub secondary_stock_total: u64,
    pub combined_total: u64,
    pub primary_identifier: String,
    pub secondary_identifier: Option<String>,
}

impl MergedRecord {
    pub fn is_matched(&self) -> bool {
        self.secondary_name.is_some()
    }
}

/// Counters collected while merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub primary_rows: usize,
    pub secondary_rows: usize,
    pub matched: usize,
    pub placeholders: usize,
    pub dropped: usize,
    /// Primary records whose identifier was empty; they cannot match.
    pub without_identifier: usize,
}

/// Result of a merge: the fixed column set plus the ordered records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedReport {
    pub columns: Vec<String>,
    pub records: Vec<MergedRecord>,
    pub stats: MergeStats,
}
