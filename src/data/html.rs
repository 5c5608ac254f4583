/// Small HTML helpers shared by the token parser and the table extractor
use scraper::{Html, Selector};

use crate::error::{IngestError, Result};

/// Selector matching the element with the exact id (no CSS escaping needed)
pub fn id_selector(id: &str) -> Result<Selector> {
    selector(&format!(r#"[id="{}"]"#, id))
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| IngestError::InvalidParameter(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Whether the document contains an element with this id
pub fn has_element(html: &str, id: &str) -> Result<bool> {
    let doc = Html::parse_document(html);
    let sel = id_selector(id)?;
    Ok(doc.select(&sel).next().is_some())
}

/// Collapse whitespace runs (including non-breaking spaces) & trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_element() {
        let html = r#"<html><body><div id="ContentPlaceHolder1_divData">x</div></body></html>"#;
        assert!(has_element(html, "ContentPlaceHolder1_divData").unwrap());
        assert!(!has_element(html, "ContentPlaceHolder1_gvReport").unwrap());
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Coupon\n  Rate\u{a0}(%) "), "Coupon Rate (%)");
        assert_eq!(collapse_whitespace(""), "");
    }
}
