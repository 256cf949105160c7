use crate::aggregate::CurrencyAggregator;
use crate::core::{ExportConfig, Invoice};

use super::layout::{
    DETAIL_SHEET, SUMMARY_SHEET, sanitize_sheet_name, write_detail_group, write_detail_header,
    write_invoice_sheet, write_summary_header, write_summary_row,
};
use super::sheet::{Sheet, Workbook};

/// Accumulates invoices into the report sheets.
///
/// Sheet order in the finished workbook: Summary, Detail (when enabled), then
/// one sheet per file in the order the files were added.
#[derive(Debug)]
pub struct ReportBuilder {
    config: ExportConfig,
    summary: Sheet,
    detail: Option<Sheet>,
    files: Workbook,
    summary_row: u32,
    detail_row: u32,
    aggregator: CurrencyAggregator,
}

impl ReportBuilder {
    pub fn new(config: ExportConfig) -> Self {
        let mut summary = Sheet::new(SUMMARY_SHEET);
        write_summary_header(&mut summary, &config.summary);

        let detail = config.consolidated_detail.then(|| {
            let mut sheet = Sheet::new(DETAIL_SHEET);
            write_detail_header(&mut sheet, &config.detail);
            sheet
        });

        Self {
            config,
            summary,
            detail,
            files: Workbook::new(),
            summary_row: 1,
            detail_row: 1,
            aggregator: CurrencyAggregator::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Add one extracted invoice under `file_stem` and return the name of the
    /// sheet its rows link to.
    ///
    /// When a sheet with the same sanitized name already exists (names are
    /// compared case-insensitively) no new sheet is created and the rows link
    /// to the existing one.
    pub fn add_invoice(&mut self, file_stem: &str, invoice: &Invoice) -> String {
        let wanted = sanitize_sheet_name(file_stem);
        let target = match self.existing_sheet(&wanted) {
            Some(existing) => {
                tracing::warn!(file = file_stem, sheet = %existing, "sheet name already in use, linking to existing sheet");
                existing
            }
            None => {
                let mut sheet = Sheet::new(wanted.as_str());
                write_invoice_sheet(&mut sheet, invoice, &self.config.detail);
                self.files.push(sheet);
                wanted
            }
        };

        write_summary_row(
            &mut self.summary,
            self.summary_row,
            &self.config.summary,
            invoice,
            &target,
        );
        self.summary_row += 1;

        if let Some(detail) = self.detail.as_mut() {
            self.detail_row =
                write_detail_group(detail, self.detail_row, invoice, &target, &self.config.detail);
        }
        self.aggregator.accumulate_invoice(invoice);
        target
    }

    fn existing_sheet(&self, name: &str) -> Option<String> {
        let lower = name.to_lowercase();
        std::iter::once(&self.summary)
            .chain(self.detail.as_ref())
            .chain(self.files.sheets())
            .find(|s| s.name().to_lowercase() == lower)
            .map(|s| s.name().to_string())
    }

    pub fn aggregator(&self) -> &CurrencyAggregator {
        &self.aggregator
    }

    /// Number of Summary rows written so far.
    pub fn rows(&self) -> usize {
        (self.summary_row - 1) as usize
    }

    /// Append the currency summary to the Detail sheet and assemble the
    /// workbook.
    pub fn finish(self) -> Workbook {
        let mut book = Workbook::new();
        book.push(self.summary);
        if let Some(mut detail) = self.detail {
            self.aggregator.render(&mut detail, self.detail_row + 1);
            book.push(detail);
        }
        for sheet in self.files.into_sheets() {
            book.push(sheet);
        }
        book
    }
}
