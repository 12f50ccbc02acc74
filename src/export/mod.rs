//! Writes a complete, date-grouped transaction collection to a PDF or spreadsheet file.
//!
//! Both formats are rendered in memory and only written to disk once rendering has succeeded, so
//! a failed export never leaves a partial file behind.

mod cursor;
mod pdf;
mod xlsx;

pub use cursor::{CancelHandle, PageCursor, MAX_PAGES};

use crate::model::{Amount, DateGroups, TransactionType};
use crate::{utils, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// The start of every export file name.
pub const BASENAME: &str = "transactions_history";

/// Shown instead of writing a file when there is nothing to export.
pub const NOTHING_TO_EXPORT: &str = "No transactions to export";

const NOT_AVAILABLE: &str = "N/A";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    /// An `.xlsx` workbook.
    Excel,
}

serde_plain::derive_display_from_serialize!(ExportFormat);
serde_plain::derive_fromstr_from_deserialize!(ExportFormat);

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }

    /// `transactions_history_2025-10-19.pdf`
    pub fn file_name(&self, day: NaiveDate) -> String {
        format!("{BASENAME}_{}.{}", day.format("%Y-%m-%d"), self.extension())
    }
}

/// What an export did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exported {
    Written(PathBuf),
    NothingToExport,
}

/// One transaction as it appears in an exported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub date: String,
    pub category: String,
    pub description: String,
    pub kind: TransactionType,
    pub amount: Amount,
}

/// Flattens date groups into rows, in group order.
pub fn rows(groups: &DateGroups) -> Vec<ExportRow> {
    groups
        .records()
        .map(|(label, t)| ExportRow {
            date: format_date(label),
            category: or_not_available(t.category_name.as_deref()),
            description: or_not_available(t.description.as_deref()),
            kind: t.transaction_type,
            amount: t.amount,
        })
        .collect()
}

fn or_not_available(s: Option<&str>) -> String {
    match s {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Totals printed at the top of a PDF and the bottom of a spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub income: Amount,
    pub expense: Amount,
    /// Income minus expense. Unlike cash in hand this may be negative.
    pub balance: Amount,
}

impl Summary {
    pub fn of(rows: &[ExportRow]) -> Self {
        let total = |kind: TransactionType| -> Amount {
            rows.iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.amount)
                .sum()
        };
        let income = total(TransactionType::Income);
        let expense = total(TransactionType::Expense);
        Self {
            income,
            expense,
            balance: income - expense,
        }
    }
}

/// Renders a date label as `5 October 2025`. Relative labels such as `Today` and anything that is
/// not an ISO date are returned unchanged.
pub fn format_date(label: &str) -> String {
    match parse_day(label) {
        Some(day) => format!("{} {} {}", day.day(), day.format("%B"), day.year()),
        None => label.to_string(),
    }
}

fn parse_day(label: &str) -> Option<NaiveDate> {
    let trimmed = label.trim();
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(day);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|t| t.date_naive())
}

/// Renders `groups` in `format`. Returns `None` when there are no transactions.
pub fn render(
    format: ExportFormat,
    groups: &DateGroups,
    generated_at: DateTime<Local>,
) -> Result<Option<Vec<u8>>> {
    let rows = rows(groups);
    if rows.is_empty() {
        return Ok(None);
    }
    let summary = Summary::of(&rows);
    let bytes = match format {
        ExportFormat::Pdf => pdf::render(&rows, &summary, generated_at)?,
        ExportFormat::Excel => xlsx::render(&rows, &summary)?,
    };
    Ok(Some(bytes))
}

/// Renders `groups` and writes the result to `dir`, creating `dir` if needed. The file is named
/// after today's UTC date.
pub async fn write(format: ExportFormat, groups: &DateGroups, dir: &Path) -> Result<Exported> {
    let Some(bytes) = render(format, groups, Local::now())? else {
        info!("{NOTHING_TO_EXPORT}");
        return Ok(Exported::NothingToExport);
    };
    utils::make_dir(dir).await?;
    let path = dir.join(format.file_name(Utc::now().date_naive()));
    utils::write(&path, bytes).await?;
    info!("Exported {} transactions to {}", groups.record_count(), path.display());
    Ok(Exported::Written(path))
}
