//! Conversion between XLSX workbooks and grids of string cells.
//!
//! [`import`] reads the first worksheet and keeps used rows only: a row with no text is
//! dropped and trailing blank cells are trimmed, while blanks between used cells stay in place so
//! columns keep their positions. [`export`] writes a single `Sheet1` where cell `(i, j)` holds
//! `grid[i][j]` as text.

// std
use std::io::Cursor;
// crates.io
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
// self
use crate::{_prelude::*, obs};

/// Rows of cell text, top to bottom.
pub type Grid = Vec<Vec<String>>;

/// Media type of exported workbooks.
pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Download name used when the caller supplies none.
pub const DEFAULT_FILENAME: &str = "export.xlsx";

/// Reads the first worksheet of an XLSX workbook into a grid.
pub fn import(bytes: &[u8]) -> Result<Grid> {
	let mut workbook = Xlsx::new(Cursor::new(bytes)).map_err(conversion_failed)?;
	let range = workbook
		.worksheet_range_at(0)
		.ok_or_else(|| conversion_failed("workbook has no worksheet"))?
		.map_err(conversion_failed)?;
	let grid = range.rows().filter_map(used_cells).collect::<Grid>();

	obs::event!(debug, rows = grid.len(), "Spreadsheet imported.");

	Ok(grid)
}

/// Writes `grid` into a single-sheet XLSX workbook.
pub fn export(grid: &[Vec<String>]) -> Result<Vec<u8>> {
	let mut workbook = Workbook::new();
	let sheet = workbook.add_worksheet();

	for (i, row) in grid.iter().enumerate() {
		let i = u32::try_from(i).map_err(conversion_failed)?;

		for (j, cell) in row.iter().enumerate() {
			let j = u16::try_from(j).map_err(conversion_failed)?;

			sheet.write_string(i, j, cell).map_err(conversion_failed)?;
		}
	}

	let bytes = workbook.save_to_buffer().map_err(conversion_failed)?;

	obs::event!(debug, rows = grid.len(), size = bytes.len(), "Spreadsheet exported.");

	Ok(bytes)
}

fn used_cells(row: &[Data]) -> Option<Vec<String>> {
	let used = row.iter().rposition(|cell| !is_blank(cell))? + 1;

	Some(
		row[..used]
			.iter()
			.map(|cell| if is_blank(cell) { String::new() } else { cell.to_string() })
			.collect(),
	)
}

fn is_blank(cell: &Data) -> bool {
	match cell {
		Data::Empty => true,
		Data::String(text) => text.is_empty(),
		_ => false,
	}
}

fn conversion_failed(reason: impl Display) -> Error {
	Error::ConversionFailed { reason: reason.to_string() }
}
