/// Conversion of the rendered results grid into CSV text
use scraper::Html;
use tracing::debug;

use super::html::{collapse_whitespace, id_selector, selector};
use crate::error::Result;

/// Grid columns, by position. The grid carries no machine-readable headers.
pub const TABLE_COLUMNS: [&str; 8] = [
    "Security Code",
    "Issuer Name",
    "Coupon Rate",
    "Maturity Date",
    "LTP",
    "Turnover (Rs. Lakhs)",
    "No. of Trades",
    "Credit Rating",
];

/// Extract the grid inside the element `table_id` as CSV with a canonical header.
///
/// Returns `Ok(None)` when the container is absent (no trades rendered).
/// Header rows and rows with fewer than `TABLE_COLUMNS.len()` cells are dropped.
pub fn extract_table(html: &str, table_id: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(html);

    let sel_container = id_selector(table_id)?;
    let sel_tr = selector("tr")?;
    let sel_th = selector("th")?;
    let sel_td = selector("td")?;

    let container = match doc.select(&sel_container).next() {
        Some(el) => el,
        None => return Ok(None),
    };

    let mut lines = vec![TABLE_COLUMNS.join(",")];
    let mut dropped = 0usize;

    for tr in container.select(&sel_tr) {
        if tr.select(&sel_th).next().is_some() {
            continue;
        }

        let cells: Vec<String> = tr
            .select(&sel_td)
            .map(|td| clean_cell(&td.text().collect::<String>()))
            .collect();

        if cells.len() < TABLE_COLUMNS.len() {
            dropped += 1;
            continue;
        }

        let line = cells
            .iter()
            .take(TABLE_COLUMNS.len())
            .map(|c| quote_csv(c))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    debug!(
        "Extracted {} grid rows from #{} ({} short rows dropped)",
        lines.len() - 1,
        table_id,
        dropped
    );

    Ok(Some(lines.join("\n")))
}

fn clean_cell(text: &str) -> String {
    let cell = collapse_whitespace(text);
    if looks_numeric(&cell) {
        cell.replace(',', "")
    } else {
        cell
    }
}

/// Digits with optional sign, thousands separators and decimal point
fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix('-').or_else(|| s.strip_prefix('+')).unwrap_or(s);
    body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn quote_csv(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
