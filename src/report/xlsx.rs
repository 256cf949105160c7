//! `.xlsx` serialization of the in-memory [`Workbook`].

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatUnderline, Url, Workbook as XlsxWorkbook,
    Worksheet, XlsxError,
};
use std::path::Path;

use crate::core::InvoiceError;

use super::sheet::{Cell, CellStyle, CellValue, Sheet, Workbook};

fn report_err(e: XlsxError) -> InvoiceError {
    InvoiceError::Report(e.to_string())
}

fn cell_format(style: &CellStyle, is_link: bool) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(size) = style.font_size {
        format = format.set_font_size(size);
    }
    if style.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    if is_link {
        format = format.set_font_color(Color::Blue);
    }
    if style.border {
        format = format.set_border(FormatBorder::Thin);
    }
    if style.v_center {
        format = format.set_align(FormatAlign::VerticalCenter);
    }
    format
}

/// `internal:` link target for cell A1 of `sheet`.
pub fn internal_link(sheet: &str) -> String {
    format!("internal:'{}'!A1", sheet.replace('\'', "''"))
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    let format = cell_format(&cell.style, cell.link.is_some());
    match (&cell.value, &cell.link) {
        (value, Some(target)) => {
            let url = Url::new(internal_link(target)).set_text(value.as_text());
            ws.write_url_with_format(row, col, url, &format)?;
        }
        (CellValue::Number(n), None) => {
            ws.write_number_with_format(row, col, *n, &format)?;
        }
        (CellValue::Text(s), None) if s.is_empty() => {
            ws.write_blank(row, col, &format)?;
        }
        (CellValue::Text(s), None) => {
            ws.write_string_with_format(row, col, s, &format)?;
        }
    }
    Ok(())
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet) -> Result<(), XlsxError> {
    ws.set_name(sheet.name())?;

    for range in sheet.merges() {
        let anchor = sheet.cell(range.first_row, range.first_col);
        let style = anchor.map(|c| c.style.clone()).unwrap_or_default();
        let text = anchor.map(|c| c.value.as_text()).unwrap_or_default();
        let format = cell_format(&style, anchor.is_some_and(|c| c.link.is_some()));
        ws.merge_range(
            range.first_row,
            range.first_col,
            range.last_row,
            range.last_col,
            &text,
            &format,
        )?;
    }

    // Anchors are rewritten after merging so links and numbers keep their type.
    for ((row, col), cell) in sheet.cells() {
        if sheet.is_merged_away(row, col) {
            continue;
        }
        write_cell(ws, row, col, cell)?;
    }

    ws.autofit();
    Ok(())
}

/// Write `book` to `path`, replacing any existing file.
pub fn save_workbook(book: &Workbook, path: &Path) -> Result<(), InvoiceError> {
    let mut xlsx = XlsxWorkbook::new();
    for sheet in book.sheets() {
        let ws = xlsx.add_worksheet();
        write_sheet(ws, sheet).map_err(report_err)?;
    }
    xlsx.save(path).map_err(report_err)?;
    tracing::info!(path = %path.display(), sheets = book.len(), "workbook saved");
    Ok(())
}
