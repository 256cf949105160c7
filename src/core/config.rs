//! Export column configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::error::InvoiceError;

/// Column toggles for one export run. Read once at the start and constant
/// for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write the cross-file "Detail" sheet with the currency summary appended.
    pub consolidated_detail: bool,
    pub summary: SummaryColumns,
    pub detail: DetailColumns,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            consolidated_detail: true,
            summary: SummaryColumns::default(),
            detail: DetailColumns::default(),
        }
    }
}

/// Optional columns of the Summary sheet, in the order they are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryColumns {
    pub seller: bool,
    pub buyer: bool,
    pub total_quantity: bool,
    pub total_before_tax: bool,
    pub tax_amount: bool,
    pub total_after_tax: bool,
    pub currency: bool,
}

impl Default for SummaryColumns {
    fn default() -> Self {
        Self {
            seller: true,
            buyer: true,
            total_quantity: true,
            total_before_tax: true,
            tax_amount: true,
            total_after_tax: true,
            currency: true,
        }
    }
}

/// Optional party columns of the per-file and consolidated detail sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailColumns {
    pub seller: bool,
    pub buyer: bool,
}

impl Default for DetailColumns {
    fn default() -> Self {
        Self {
            seller: true,
            buyer: true,
        }
    }
}

impl ExportConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InvoiceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| InvoiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, InvoiceError> {
        toml::from_str(content).map_err(|e| InvoiceError::Config(e.to_string()))
    }

    /// Fixed columns only: every optional column switched off.
    pub fn minimal() -> Self {
        Self {
            consolidated_detail: false,
            summary: SummaryColumns {
                seller: false,
                buyer: false,
                total_quantity: false,
                total_before_tax: false,
                tax_amount: false,
                total_after_tax: false,
                currency: false,
            },
            detail: DetailColumns {
                seller: false,
                buyer: false,
            },
        }
    }
}

/// Builder for [`ExportConfig`], starting from the all-columns default.
///
/// ```
/// use hoadon::core::ExportConfigBuilder;
///
/// let config = ExportConfigBuilder::new()
///     .summary_seller(false)
///     .detail_buyer(false)
///     .build();
/// assert!(!config.summary.seller);
/// assert!(config.summary.buyer);
/// ```
#[derive(Debug, Default)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consolidated_detail(mut self, on: bool) -> Self {
        self.config.consolidated_detail = on;
        self
    }

    pub fn summary_seller(mut self, on: bool) -> Self {
        self.config.summary.seller = on;
        self
    }

    pub fn summary_buyer(mut self, on: bool) -> Self {
        self.config.summary.buyer = on;
        self
    }

    pub fn total_quantity(mut self, on: bool) -> Self {
        self.config.summary.total_quantity = on;
        self
    }

    pub fn total_before_tax(mut self, on: bool) -> Self {
        self.config.summary.total_before_tax = on;
        self
    }

    pub fn tax_amount(mut self, on: bool) -> Self {
        self.config.summary.tax_amount = on;
        self
    }

    pub fn total_after_tax(mut self, on: bool) -> Self {
        self.config.summary.total_after_tax = on;
        self
    }

    pub fn currency(mut self, on: bool) -> Self {
        self.config.summary.currency = on;
        self
    }

    pub fn detail_seller(mut self, on: bool) -> Self {
        self.config.detail.seller = on;
        self
    }

    pub fn detail_buyer(mut self, on: bool) -> Self {
        self.config.detail.buyer = on;
        self
    }

    pub fn build(self) -> ExportConfig {
        self.config
    }
}
