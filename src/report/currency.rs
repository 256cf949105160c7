//! Currency summary block appended to the consolidated Detail sheet.

use crate::aggregate::CurrencyAggregator;
use crate::core::format_decimal;

use super::layout::{RATE_HEADERS, TOTAL_LABELS};
use super::sheet::{CellRange, Sheet};

const TITLE: &str = "TỔNG KẾT THEO TỪNG LOẠI TIỀN TỆ";
const CURRENCY_COLUMN: &str = "Đơn vị tiền tệ";
const TITLE_FONT_SIZE: f64 = 14.0;
const CURRENCY_FONT_SIZE: f64 = 12.0;

impl CurrencyAggregator {
    /// Write the per-currency summary with its title at `title_row` and return
    /// the row after the block.
    ///
    /// Currencies and rate labels appear in lexicographic order. The block is
    /// bordered from the title through the last grand-total row.
    pub fn render(&self, sheet: &mut Sheet, title_row: u32) -> u32 {
        sheet
            .set_text(title_row, 0, TITLE)
            .bold()
            .font_size(TITLE_FONT_SIZE);

        let mut row = title_row + 2;
        let mut last_written = title_row;
        for section in self.sections() {
            let currency = section.currency;
            sheet
                .set_text(row, 0, format!("TIỀN TỆ: {currency}"))
                .bold()
                .font_size(CURRENCY_FONT_SIZE);
            row += 1;

            sheet.header_row(row, 0, &RATE_HEADERS);
            sheet.set_text(row, 3, CURRENCY_COLUMN).bold();
            row += 1;

            for (label, totals) in &section.rates {
                sheet.set_text(row, 0, format_decimal(totals.pre_tax));
                sheet.set_text(row, 1, *label);
                sheet.set_text(row, 2, format_decimal(totals.tax));
                sheet.set_text(row, 3, currency);
                row += 1;
            }

            // One blank row, then the three grand totals.
            row += 1;
            let grand = [
                section.totals.before_tax,
                section.totals.tax,
                section.totals.after_tax,
            ];
            for (label, amount) in TOTAL_LABELS.iter().zip(grand) {
                sheet.set_text(row, 0, *label).bold();
                sheet.set_text(row, 1, format_decimal(amount));
                sheet.set_text(row, 2, currency);
                last_written = row;
                row += 1;
            }
            row += 1;
        }

        sheet.border(CellRange::new(title_row, 0, last_written, 3));
        tracing::debug!(
            currencies = self.currencies().count(),
            first_row = title_row,
            last_row = last_written,
            "rendered currency summary"
        );
        row
    }
}
