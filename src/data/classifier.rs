/// Classification of raw export bodies
use serde::Serialize;
use tracing::{debug, warn};

const BOM: char = '\u{feff}';

/// Why a date produced nothing to store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoDataReason {
    /// The search page had no results container
    NoResults,
    /// The export request rendered a page instead of data
    HtmlFallback,
    /// The response body was empty
    EmptyBody,
}

impl NoDataReason {
    pub fn as_str(&self) -> &str {
        match self {
            NoDataReason::NoResults => "NO_RESULTS",
            NoDataReason::HtmlFallback => "HTML_FALLBACK",
            NoDataReason::EmptyBody => "EMPTY_BODY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Delimited text ready for normalization (BOM stripped)
    DataPayload(String),
    NoData(NoDataReason),
}

/// Decide whether a body is exportable data
pub fn classify(raw: &str) -> Classification {
    let body = strip_bom(raw.trim()).trim();

    if body.is_empty() {
        debug!("Empty response body");
        return Classification::NoData(NoDataReason::EmptyBody);
    }

    if body.starts_with('<') {
        let head: String = body.chars().take(60).collect();
        warn!("Server rendered HTML instead of data: {}", head);
        return Classification::NoData(NoDataReason::HtmlFallback);
    }

    Classification::DataPayload(body.to_string())
}

pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix(BOM).unwrap_or(s)
}
