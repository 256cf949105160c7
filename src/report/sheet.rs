//! In-memory workbook model.
//!
//! Sheets are laid out here first and serialized to `.xlsx` in one pass at
//! save time, so layout can be inspected without touching the file system.
//! Rows and columns are 0-based.

use std::collections::BTreeMap;

/// Cell content.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Display text, numbers without a trailing `.0`.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub bold: bool,
    pub font_size: Option<f64>,
    pub underline: bool,
    /// Thin border on all four sides.
    pub border: bool,
    pub v_center: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
    /// Internal hyperlink: name of the target sheet (cell A1).
    pub link: Option<String>,
}

impl Cell {
    fn empty() -> Self {
        Self {
            value: CellValue::Text(String::new()),
            style: CellStyle::default(),
            link: None,
        }
    }

    pub fn bold(&mut self) -> &mut Self {
        self.style.bold = true;
        self
    }

    pub fn font_size(&mut self, size: f64) -> &mut Self {
        self.style.font_size = Some(size);
        self
    }

    /// Underlined link to `A1` of `sheet`.
    pub fn link_to(&mut self, sheet: &str) -> &mut Self {
        self.link = Some(sheet.to_string());
        self.style.underline = true;
        self
    }

    pub fn is_blank(&self) -> bool {
        matches!(&self.value, CellValue::Text(s) if s.is_empty())
    }
}

/// Inclusive cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    pub fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    /// Single-column range spanning `rows` rows from `first_row`.
    pub fn column(col: u16, first_row: u32, rows: u32) -> Self {
        Self::new(first_row, col, first_row + rows.saturating_sub(1), col)
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    merges: Vec<CellRange>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_text(&mut self, row: u32, col: u16, text: impl Into<String>) -> &mut Cell {
        let cell = self.cell_mut(row, col);
        cell.value = CellValue::Text(text.into());
        cell
    }

    pub fn set_number(&mut self, row: u32, col: u16, value: f64) -> &mut Cell {
        let cell = self.cell_mut(row, col);
        cell.value = CellValue::Number(value);
        cell
    }

    /// Write `values` left to right starting at `col`, in bold.
    pub fn header_row(&mut self, row: u32, col: u16, values: &[&str]) {
        for (offset, value) in values.iter().enumerate() {
            self.set_text(row, col + offset as u16, *value).bold();
        }
    }

    /// Existing cell or a fresh blank one.
    pub fn cell_mut(&mut self, row: u32, col: u16) -> &mut Cell {
        self.cells.entry((row, col)).or_insert_with(Cell::empty)
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Text of a cell, `""` when empty.
    pub fn text(&self, row: u32, col: u16) -> String {
        self.cell(row, col)
            .map(|c| c.value.as_text())
            .unwrap_or_default()
    }

    /// Merge `range` and center its anchor vertically. Single-cell ranges are
    /// ignored.
    pub fn merge(&mut self, range: CellRange) {
        if range.first_row == range.last_row && range.first_col == range.last_col {
            return;
        }
        self.cell_mut(range.first_row, range.first_col).style.v_center = true;
        self.merges.push(range);
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// Thin border on every cell of `range`, creating blank cells as needed.
    pub fn border(&mut self, range: CellRange) {
        for row in range.first_row..=range.last_row {
            for col in range.first_col..=range.last_col {
                self.cell_mut(row, col).style.border = true;
            }
        }
    }

    /// Last used row, if any.
    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().map(|(row, _)| *row).max()
    }

    /// First row after the used range.
    pub fn next_row(&self) -> u32 {
        self.last_row().map_or(0, |r| r + 1)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    /// Whether `(row, col)` is covered by a merge without being its anchor.
    pub fn is_merged_away(&self, row: u32, col: u16) -> bool {
        self.merges
            .iter()
            .any(|m| m.contains(row, col) && (m.first_row, m.first_col) != (row, col))
    }

    /// One line per used row, cells joined with ` | `. Handy for tests and
    /// debug logs.
    pub fn dump(&self) -> String {
        let Some(last) = self.last_row() else {
            return String::new();
        };
        let width = self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0);
        let mut out = String::new();
        for row in 0..=last {
            let line: Vec<String> = (0..=width).map(|col| self.text(row, col)).collect();
            out.push_str(line.join(" | ").trim_end_matches([' ', '|']));
            out.push('\n');
        }
        out
    }
}

/// Ordered collection of sheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet and return its index.
    pub fn push(&mut self, sheet: Sheet) -> usize {
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    /// Index of the sheet named `name`, compared case-insensitively the way
    /// spreadsheet applications do.
    pub fn position(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.sheets
            .iter()
            .position(|s| s.name.to_lowercase() == wanted)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.position(name).map(|i| &self.sheets[i])
    }

    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn into_sheets(self) -> Vec<Sheet> {
        self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
