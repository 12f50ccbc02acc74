//! A4 PDF rendering.
//!
//! Layout happens first, in millimetres measured down from the top of the page, producing a list
//! of pages of placed items. Rendering then draws those items with `printpdf`, whose y axis runs up
//! from the bottom of the page.

use crate::export::{ExportRow, Summary};
use crate::Result;
use anyhow::anyhow;
use chrono::{DateTime, Local};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

const TITLE: &str = "Transactions History";
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const RULE_END: f32 = 190.0;
const RULE_THICKNESS: f32 = 0.5;
const LINE_HEIGHT: f32 = 7.0;
const LAYER: &str = "Layer 1";

/// Table columns: heading, x position and the most characters a cell may show.
const COLUMNS: [(&str, f32, Option<usize>); 5] = [
    ("Date", MARGIN, Some(15)),
    ("Category", MARGIN + 40.0, Some(20)),
    ("Description", MARGIN + 80.0, Some(25)),
    ("Type", MARGIN + 130.0, None),
    ("Amount", MARGIN + 160.0, None),
];

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Item {
    Text {
        text: String,
        size: f32,
        bold: bool,
        x: f32,
        y: f32,
    },
    Rule {
        from: f32,
        to: f32,
        y: f32,
    },
}

pub(super) type Page = Vec<Item>;

/// Places every element of the document.
pub(super) fn layout(rows: &[ExportRow], summary: &Summary, generated_on: &str) -> Vec<Page> {
    let mut page: Page = Vec::new();
    let mut y = MARGIN;
    let text = |page: &mut Page, text: String, size: f32, bold: bool, x: f32, y: f32| {
        page.push(Item::Text {
            text,
            size,
            bold,
            x,
            y,
        })
    };

    text(&mut page, TITLE.to_string(), 16.0, false, MARGIN, y);
    y += 10.0;
    text(
        &mut page,
        format!("Generated on: {generated_on}"),
        10.0,
        false,
        MARGIN,
        y,
    );
    y += 10.0;

    text(&mut page, "Summary:".to_string(), 12.0, false, MARGIN, y);
    y += LINE_HEIGHT;
    let totals = [
        ("Total Income", summary.income),
        ("Total Expense", summary.expense),
        ("Balance", summary.balance),
    ];
    for (label, amount) in totals {
        text(
            &mut page,
            format!("{label}: {}", amount.rupees()),
            10.0,
            false,
            MARGIN + 5.0,
            y,
        );
        y += LINE_HEIGHT;
    }
    y += 10.0 - LINE_HEIGHT;

    for (heading, x, _) in COLUMNS {
        text(&mut page, heading.to_string(), 10.0, true, x, y);
    }
    y += LINE_HEIGHT;
    page.push(Item::Rule {
        from: MARGIN,
        to: RULE_END,
        y,
    });
    y += 5.0;

    let mut pages = Vec::new();
    for row in rows {
        if y > PAGE_HEIGHT - MARGIN {
            pages.push(std::mem::take(&mut page));
            y = MARGIN;
        }
        let cells = [
            row.date.clone(),
            row.category.clone(),
            row.description.clone(),
            row.kind.label().to_string(),
            row.amount.rupees(),
        ];
        for ((_, x, limit), cell) in COLUMNS.into_iter().zip(cells) {
            let cell = match limit {
                Some(n) => truncate(&cell, n),
                None => cell,
            };
            text(&mut page, cell, 9.0, false, x, y);
        }
        y += LINE_HEIGHT;
    }
    pages.push(page);
    pages
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Lays out and draws the document, returning the PDF bytes.
pub(super) fn render(
    rows: &[ExportRow],
    summary: &Summary,
    generated_at: DateTime<Local>,
) -> Result<Vec<u8>> {
    let generated_on = generated_at.format("%-d/%-m/%Y, %-I:%M:%S %p").to_string();
    let pages = layout(rows, summary, &generated_on);

    let (doc, first_page, first_layer) =
        PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("Unable to load the PDF font: {e:?}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("Unable to load the PDF font: {e:?}"))?;

    for (i, items) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
            doc.get_page(page).get_layer(layer)
        };
        draw(&layer, items, &regular, &bold);
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow!("Unable to render the PDF: {e:?}"))
}

fn draw(
    layer: &PdfLayerReference,
    items: &[Item],
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    layer.set_outline_thickness(RULE_THICKNESS);
    for item in items {
        match item {
            Item::Text {
                text,
                size,
                bold: is_bold,
                x,
                y,
            } => {
                let font = if *is_bold { bold } else { regular };
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(PAGE_HEIGHT - y), font);
            }
            Item::Rule { from, to, y } => {
                let y = Mm(PAGE_HEIGHT - y);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*from), y), false),
                        (Point::new(Mm(*to), y), false),
                    ],
                    is_closed: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::rows;
    use crate::export::tests::fixture;
    use crate::model::{Amount, DateGroups, Transaction, TransactionType};

    fn texts(page: &Page) -> Vec<&str> {
        page.iter()
            .filter_map(|item| match item {
                Item::Text { text, .. } => Some(text.as_str()),
                Item::Rule { .. } => None,
            })
            .collect()
    }

    fn layout_fixture() -> Vec<Page> {
        let rows = rows(&fixture());
        layout(&rows, &Summary::of(&rows), "19/10/2026, 9:00:00 AM")
    }

    #[test]
    fn test_header_and_summary() {
        let pages = layout_fixture();
        assert_eq!(pages.len(), 1);
        let t = texts(&pages[0]);
        assert_eq!(t[0], "Transactions History");
        assert_eq!(t[1], "Generated on: 19/10/2026, 9:00:00 AM");
        assert_eq!(t[2], "Summary:");
        assert_eq!(t[3], "Total Income: Rs. 250000.10");
        assert_eq!(t[4], "Total Expense: Rs. 6260.50");
        assert_eq!(t[5], "Balance: Rs. 243739.60");
        assert_eq!(&t[6..11], &["Date", "Category", "Description", "Type", "Amount"]);
    }

    #[test]
    fn test_table_header_is_bold_with_rule() {
        let pages = layout_fixture();
        let bold: Vec<&Item> = pages[0]
            .iter()
            .filter(|i| matches!(i, Item::Text { bold: true, .. }))
            .collect();
        assert_eq!(bold.len(), 5);
        let rule = pages[0]
            .iter()
            .find_map(|i| match i {
                Item::Rule { from, to, y } => Some((*from, *to, *y)),
                Item::Text { .. } => None,
            })
            .unwrap();
        assert_eq!(rule, (20.0, 190.0, 78.0));
    }

    #[test]
    fn test_cells_are_truncated() {
        let pages = layout_fixture();
        let t = texts(&pages[0]);
        assert!(t.contains(&"A very long description t"));
        assert!(!t.iter().any(|s| s.contains("does not fit")));
        assert!(t.contains(&"Rs. 5000.00"));
        assert!(t.contains(&"N/A"));
    }

    #[test]
    fn test_paginates() {
        let mut groups = DateGroups::new();
        for i in 0..60 {
            groups.push(
                "2025-10-01",
                Transaction::new(
                    "Groceries",
                    format!("item {i}"),
                    TransactionType::Expense,
                    Amount::ZERO,
                ),
            );
        }
        let rows = rows(&groups);
        let pages = layout(&rows, &Summary::of(&rows), "now");

        // Rows start at y = 83 and advance by 7; the first row past 277 goes on a new page.
        let first_page_rows = texts(&pages[0])
            .iter()
            .filter(|s| s.starts_with("item "))
            .count();
        assert_eq!(first_page_rows, 28);
        assert_eq!(pages.len(), 2);
        let on_page_two = texts(&pages[1]);
        assert_eq!(on_page_two[0], "1 October 2025");
        match &pages[1][0] {
            Item::Text { y, .. } => assert_eq!(*y, 20.0),
            other => panic!("unexpected {other:?}"),
        }
        let total: usize = pages
            .iter()
            .map(|p| texts(p).iter().filter(|s| s.starts_with("item ")).count())
            .sum();
        assert_eq!(total, 60);
    }

    #[test]
    fn test_render_produces_pdf() {
        let rows = rows(&fixture());
        let bytes = render(&rows, &Summary::of(&rows), Local::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
