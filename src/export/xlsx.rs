//! Spreadsheet rendering: a single "Transactions" sheet, one row per transaction followed by a
//! summary block.

use crate::export::{ExportRow, Summary};
use crate::Result;
use rust_xlsxwriter::Workbook;

const SHEET: &str = "Transactions";

/// Column headings and their widths in characters.
const COLUMNS: [(&str, f64); 5] = [
    ("Date", 20.0),
    ("Category", 20.0),
    ("Description", 30.0),
    ("Type", 12.0),
    ("Amount", 15.0),
];

const DATE: u16 = 0;
const CATEGORY: u16 = 1;
const AMOUNT: u16 = 4;

pub(super) fn render(rows: &[ExportRow], summary: &Summary) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET)?;

    for (col, (heading, width)) in COLUMNS.into_iter().enumerate() {
        let col = col as u16;
        sheet.write_string(0, col, heading)?;
        sheet.set_column_width(col, width)?;
    }

    let mut row_index: u32 = 1;
    for row in rows {
        let amount = row.amount.to_string();
        let cells = [
            row.date.as_str(),
            row.category.as_str(),
            row.description.as_str(),
            row.kind.label(),
            amount.as_str(),
        ];
        for (col, cell) in cells.into_iter().enumerate() {
            sheet.write_string(row_index, col as u16, cell)?;
        }
        row_index += 1;
    }

    // A blank row separates the summary from the data.
    row_index += 1;
    sheet.write_string(row_index, DATE, "Summary")?;
    let totals = [
        ("Total Income", summary.income),
        ("Total Expense", summary.expense),
        ("Balance", summary.balance),
    ];
    for (label, amount) in totals {
        row_index += 1;
        sheet.write_string(row_index, CATEGORY, label)?;
        sheet.write_string(row_index, AMOUNT, amount.to_string())?;
    }

    Ok(workbook.save_to_buffer()?)
}
