/// Hidden form state of the search page
use scraper::Html;

use crate::data::html::id_selector;
use crate::error::{IngestError, Result};

pub const VIEWSTATE: &str = "__VIEWSTATE";
pub const VIEWSTATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";
pub const EVENT_VALIDATION: &str = "__EVENTVALIDATION";

/// Anti-forgery state that must be echoed back verbatim.
///
/// Single-use: not `Clone`, and every request that submits it takes it by
/// value.
#[derive(Debug, PartialEq, Eq)]
pub struct FormToken {
    viewstate: String,
    viewstate_generator: String,
    event_validation: String,
}

impl FormToken {
    /// Read the three hidden inputs; any of them missing is `ProtocolDrift`
    pub fn parse(html: &str) -> Result<Self> {
        let doc = Html::parse_document(html);

        Ok(FormToken {
            viewstate: hidden_value(&doc, VIEWSTATE)?
                .filter(|v| !v.is_empty())
                .ok_or_else(|| missing(VIEWSTATE))?,
            viewstate_generator: hidden_value(&doc, VIEWSTATE_GENERATOR)?
                .ok_or_else(|| missing(VIEWSTATE_GENERATOR))?,
            event_validation: hidden_value(&doc, EVENT_VALIDATION)?
                .ok_or_else(|| missing(EVENT_VALIDATION))?,
        })
    }

    pub fn viewstate(&self) -> &str {
        &self.viewstate
    }

    pub fn viewstate_generator(&self) -> &str {
        &self.viewstate_generator
    }

    pub fn event_validation(&self) -> &str {
        &self.event_validation
    }

    /// Consume the token into its form fields
    pub fn into_fields(self) -> Vec<(String, String)> {
        vec![
            (VIEWSTATE.to_string(), self.viewstate),
            (VIEWSTATE_GENERATOR.to_string(), self.viewstate_generator),
            (EVENT_VALIDATION.to_string(), self.event_validation),
        ]
    }
}

fn hidden_value(doc: &Html, id: &str) -> Result<Option<String>> {
    let sel = id_selector(id)?;
    Ok(doc
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(str::to_string))
}

fn missing(id: &str) -> IngestError {
    IngestError::ProtocolDrift(format!("hidden field {} not found in page", id))
}
