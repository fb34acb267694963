//! Named configuration for a merge run.
//!
//! Every column label, the matching key, the stock sentinels and the
//! unmatched-record policy live here so that nothing about a particular pair
//! of storefront exports is baked into the pipeline. Profiles can be loaded
//! from JSON; only [`NoMatchPolicy`] has no default and must always be stated.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};

/// Which identifier column of a source takes part in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierField {
    Sku,
    Barcode,
}

/// Identifier columns compared between the two sources. The fields may differ,
/// e.g. a primary barcode matched against a secondary SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMapping {
    pub primary: IdentifierField,
    pub secondary: IdentifierField,
}

impl KeyMapping {
    /// Compares the same field on both sides.
    pub fn same(field: IdentifierField) -> Self {
        Self {
            primary: field,
            secondary: field,
        }
    }
}

impl Default for KeyMapping {
    fn default() -> Self {
        Self::same(IdentifierField::Sku)
    }
}

/// What happens to a primary record that has no secondary counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoMatchPolicy {
    /// Leave the record out of the report.
    Drop,
    /// Keep the record with zero secondary stock and `N/A` descriptors.
    Placeholder,
}

/// Where header names come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderSource {
    /// The first non-blank line or row carries the headers.
    #[default]
    FirstRow,
    /// The export has no header line; names are supplied here and every line
    /// is data.
    Explicit { columns: Vec<String> },
}

/// How the secondary source reports stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StockLayout {
    /// One column holds the whole secondary quantity.
    OnHand { column: String },
    /// One column per physical location, summed into the secondary total.
    Locations { names: Vec<String> },
}

impl StockLayout {
    /// Location names when the layout is per-location.
    pub fn locations(&self) -> Option<&[String]> {
        match self {
            StockLayout::OnHand { .. } => None,
            StockLayout::Locations { names } => Some(names),
        }
    }
}

impl Default for StockLayout {
    fn default() -> Self {
        StockLayout::OnHand {
            column: "On hand".to_string(),
        }
    }
}

/// Column labels of the primary storefront export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryProfile {
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub stock: String,
    /// Availability flag; when configured and present in a row, a false or
    /// empty value forces the stock quantity to zero.
    pub in_stock: Option<String>,
    pub header: HeaderSource,
}

impl Default for PrimaryProfile {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            sku: "SKU".to_string(),
            barcode: Some("Barcode".to_string()),
            stock: "Stock".to_string(),
            in_stock: Some("In stock?".to_string()),
            header: HeaderSource::FirstRow,
        }
    }
}

/// Column labels of the secondary storefront export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryProfile {
    pub title: String,
    pub sku: String,
    /// Consulted when the SKU cell is empty.
    pub sku_fallback: Option<String>,
    pub barcode: Option<String>,
    pub variant: String,
    pub stock: StockLayout,
    pub header: HeaderSource,
}

impl Default for SecondaryProfile {
    fn default() -> Self {
        Self {
            title: "Title".to_string(),
            sku: "SKU".to_string(),
            sku_fallback: Some("Handle".to_string()),
            barcode: Some("Barcode".to_string()),
            variant: "Option1 Value".to_string(),
            stock: StockLayout::default(),
            header: HeaderSource::FirstRow,
        }
    }
}

/// Knobs for delimited-text ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub delimiter: char,
    /// Split lines on the delimiter without honouring quotes. Only for parity
    /// with legacy reports; corrupts fields that contain the delimiter.
    pub legacy_split: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            legacy_split: false,
        }
    }
}

/// Serialization of the merged report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Xlsx,
}

impl OutputFormat {
    /// Picks a format from a file extension, falling back to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => OutputFormat::Xlsx,
            _ => OutputFormat::Csv,
        }
    }
}

/// Labels and format of the emitted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub format: Option<OutputFormat>,
    pub primary_label: String,
    pub secondary_label: String,
    pub sheet_name: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: None,
            primary_label: "Primary".to_string(),
            secondary_label: "Secondary".to_string(),
            sheet_name: "Stock Comparison".to_string(),
        }
    }
}

fn default_sentinels() -> Vec<String> {
    vec!["not stocked".to_string(), "not tracked".to_string()]
}

/// Full configuration of one merge invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub primary: PrimaryProfile,
    #[serde(default)]
    pub secondary: SecondaryProfile,
    #[serde(default)]
    pub key: KeyMapping,
    #[serde(default = "default_sentinels")]
    pub stock_sentinels: Vec<String>,
    pub on_no_match: NoMatchPolicy,
    #[serde(default)]
    pub parsing: ParseOptions,
    #[serde(default)]
    pub report: ReportOptions,
}

impl MergeConfig {
    /// Builds a configuration with default column labels. The no-match policy
    /// is the one setting that is never implied.
    pub fn new(on_no_match: NoMatchPolicy) -> Self {
        Self {
            primary: PrimaryProfile::default(),
            secondary: SecondaryProfile::default(),
            key: KeyMapping::default(),
            stock_sentinels: default_sentinels(),
            on_no_match,
            parsing: ParseOptions::default(),
            report: ReportOptions::default(),
        }
    }

    /// Parses a JSON profile.
    pub fn from_json(source: &str) -> Result<Self> {
        let config: MergeConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON profile from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MergeError::MissingInput(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Rejects settings that cannot drive a merge.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("primary.name", self.primary.name.as_str()),
            ("primary.sku", self.primary.sku.as_str()),
            ("primary.stock", self.primary.stock.as_str()),
            ("secondary.title", self.secondary.title.as_str()),
            ("secondary.sku", self.secondary.sku.as_str()),
            ("secondary.variant", self.secondary.variant.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(MergeError::InvalidConfig(format!(
                    "column name for {field} is empty"
                )));
            }
        }

        if self.key.primary == IdentifierField::Barcode && self.primary.barcode.is_none() {
            return Err(MergeError::InvalidConfig(
                "primary key is barcode but no primary barcode column is configured".into(),
            ));
        }
        if self.key.secondary == IdentifierField::Barcode && self.secondary.barcode.is_none() {
            return Err(MergeError::InvalidConfig(
                "secondary key is barcode but no secondary barcode column is configured".into(),
            ));
        }

        match &self.secondary.stock {
            StockLayout::OnHand { column } if column.trim().is_empty() => {
                return Err(MergeError::InvalidConfig(
                    "on-hand stock column name is empty".into(),
                ));
            }
            StockLayout::Locations { names } if names.is_empty() => {
                return Err(MergeError::InvalidConfig(
                    "per-location stock layout lists no locations".into(),
                ));
            }
            StockLayout::Locations { names } if names.iter().any(|n| n.trim().is_empty()) => {
                return Err(MergeError::InvalidConfig("location name is empty".into()));
            }
            _ => {}
        }

        for header in [&self.primary.header, &self.secondary.header] {
            if let HeaderSource::Explicit { columns } = header {
                if columns.is_empty() {
                    return Err(MergeError::InvalidConfig(
                        "explicit header list is empty".into(),
                    ));
                }
            }
        }

        if !self.parsing.delimiter.is_ascii() || self.parsing.delimiter == '"' {
            return Err(MergeError::InvalidConfig(format!(
                "unsupported delimiter {:?}",
                self.parsing.delimiter
            )));
        }

        Ok(())
    }
}
