/// Session-replay client for the BSE corporate debt search form.
///
/// The page is an ASP.NET form with no API behind it. A fetch is three
/// dependent requests: GET the page for the first token and cookies, POST
/// the search for a second-generation token, then POST again with the
/// download control as event target to get the export.
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info, warn};

use super::cookies::SessionCookies;
use super::tokens::FormToken;
use super::transport::{HttpResponse, HttpTransport};
use crate::data::html::has_element;
use crate::data::{classify, extract_table, Classification, NoDataReason};
use crate::error::{IngestError, Result};
use crate::types::{BseConfig, BseFetchMode, TradeDate};

const FIELD_EVENT_TARGET: &str = "__EVENTTARGET";
const FIELD_EVENT_ARGUMENT: &str = "__EVENTARGUMENT";
const FIELD_FROM_DATE: &str = "ctl00$ContentPlaceHolder1$txtFromDate";
const FIELD_TO_DATE: &str = "ctl00$ContentPlaceHolder1$txtToDate";
const SUBMIT_BUTTON: (&str, &str) = ("ctl00$ContentPlaceHolder1$btnSubmit", "Submit");
const DOWNLOAD_CONTROL: &str = "ctl00$ContentPlaceHolder1$lnkDownload";

/// Selects the debt segment and bond instruments
const SEARCH_SCOPE: &[(&str, &str)] = &[
    ("ctl00$ContentPlaceHolder1$ddlSegment", "Debt"),
    ("ctl00$ContentPlaceHolder1$ddlInstrument", "Bonds"),
    ("ctl00$ContentPlaceHolder1$rblReportType", "EOD"),
];

/// Result of the search submission
#[derive(Debug)]
pub enum SearchOutcome {
    /// Trades exist; the page carries the next token
    Results { token: FormToken, page: String },
    /// No results container: nothing traded on the date
    NoResults,
}

/// BSE debt search client
pub struct BseDebtClient {
    transport: Arc<dyn HttpTransport>,
    page_url: String,
    origin: String,
    mode: BseFetchMode,
    results_marker_id: String,
    results_table_id: String,
}

impl BseDebtClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &BseConfig) -> Result<Self> {
        let url = Url::parse(&config.page_url)
            .map_err(|e| IngestError::ConfigError(format!("Invalid bse.page_url: {}", e)))?;

        Ok(BseDebtClient {
            transport,
            page_url: config.page_url.clone(),
            origin: url.origin().ascii_serialization(),
            mode: config.mode,
            results_marker_id: config.results_marker_id.clone(),
            results_table_id: config.results_table_id.clone(),
        })
    }

    /// Full replay for one date
    pub async fn fetch(&self, date: TradeDate) -> Result<Classification> {
        info!("📥 BSE: replaying search session for {}", date);

        let (token, mut cookies) = self.open_session().await?;

        let (token, page) = match self.submit_search(token, &mut cookies, date).await? {
            SearchOutcome::Results { token, page } => (token, page),
            SearchOutcome::NoResults => {
                info!("BSE: no trades recorded for {}", date);
                return Ok(Classification::NoData(NoDataReason::NoResults));
            }
        };

        match self.mode {
            BseFetchMode::Table => match extract_table(&page, &self.results_table_id)? {
                Some(text) => Ok(Classification::DataPayload(text)),
                None => {
                    warn!("BSE: results grid #{} missing for {}", self.results_table_id, date);
                    Ok(Classification::NoData(NoDataReason::NoResults))
                }
            },
            BseFetchMode::Export => {
                let body = self.trigger_export(token, &mut cookies, date).await?;
                Ok(classify(&body))
            }
        }
    }

    /// GET the search page for the first token and the session cookies
    pub async fn open_session(&self) -> Result<(FormToken, SessionCookies)> {
        let response = self.transport.get(&self.page_url, &[]).await?;
        let response = ensure_success(response, "search page")?;

        let mut cookies = SessionCookies::new();
        cookies.absorb(&response.set_cookies);

        let token = FormToken::parse(&response.body)?;
        debug!("BSE: session opened with {} cookies", cookies.len());

        Ok((token, cookies))
    }

    /// POST the search form; yields the second-generation token
    pub async fn submit_search(
        &self,
        token: FormToken,
        cookies: &mut SessionCookies,
        date: TradeDate,
    ) -> Result<SearchOutcome> {
        let mut form = token.into_fields();
        form.push((FIELD_EVENT_TARGET.to_string(), String::new()));
        form.push((FIELD_EVENT_ARGUMENT.to_string(), String::new()));
        form.extend(date_and_scope(date));
        form.push((SUBMIT_BUTTON.0.to_string(), SUBMIT_BUTTON.1.to_string()));

        let response = self
            .transport
            .post_form(&self.page_url, &self.form_headers(cookies), &form)
            .await?;
        let response = ensure_success(response, "search submission")?;
        cookies.absorb(&response.set_cookies);

        if !has_element(&response.body, &self.results_marker_id)? {
            return Ok(SearchOutcome::NoResults);
        }

        let token = FormToken::parse(&response.body)?;
        Ok(SearchOutcome::Results {
            token,
            page: response.body,
        })
    }

    /// POST with the download control as event target; returns the raw body
    pub async fn trigger_export(
        &self,
        token: FormToken,
        cookies: &mut SessionCookies,
        date: TradeDate,
    ) -> Result<String> {
        let mut form = token.into_fields();
        form.push((FIELD_EVENT_TARGET.to_string(), DOWNLOAD_CONTROL.to_string()));
        form.push((FIELD_EVENT_ARGUMENT.to_string(), String::new()));
        form.extend(date_and_scope(date));

        let response = self
            .transport
            .post_form(&self.page_url, &self.form_headers(cookies), &form)
            .await?;
        let response = ensure_success(response, "export")?;
        cookies.absorb(&response.set_cookies);

        debug!("BSE: export returned {} bytes", response.body.len());
        Ok(response.body)
    }

    /// The server's request validation rejects posts without these
    fn form_headers(&self, cookies: &SessionCookies) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Origin".to_string(), self.origin.clone()),
            ("Referer".to_string(), self.page_url.clone()),
        ];
        if let Some(cookie) = cookies.header_value() {
            headers.push(("Cookie".to_string(), cookie));
        }
        headers
    }
}

fn date_and_scope(date: TradeDate) -> Vec<(String, String)> {
    let text = date.form_text();
    let mut fields = vec![
        (FIELD_FROM_DATE.to_string(), text.clone()),
        (FIELD_TO_DATE.to_string(), text),
    ];
    fields.extend(
        SEARCH_SCOPE
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string())),
    );
    fields
}

fn ensure_success(response: HttpResponse, step: &str) -> Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(IngestError::UpstreamUnavailable(format!(
            "BSE {} returned HTTP {}",
            step, response.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::{form_page, ScriptedTransport};

    const MARKER: &str = r#"<div id="ContentPlaceHolder1_divData"></div>"#;

    fn client(transport: Arc<ScriptedTransport>, mode: BseFetchMode) -> BseDebtClient {
        let config = BseConfig {
            page_url: "https://www.bseindia.com/markets/debt/DebtCorporateEOD.aspx".to_string(),
            mode,
            ..BseConfig::default()
        };
        BseDebtClient::new(transport, &config).unwrap()
    }

    fn date() -> TradeDate {
        TradeDate::parse("2026-01-28").unwrap()
    }

    fn transcript() -> ScriptedTransport {
        ScriptedTransport::new()
            .respond(
                200,
                &["ASP.NET_SessionId=s1; path=/; HttpOnly", "bm_sv=b1; Max-Age=7200"],
                &form_page("VS-ONE", "GEN-1", "EV-ONE", ""),
            )
            .respond(
                200,
                &["bm_sv=b2; Max-Age=7200"],
                &form_page("VS-TWO", "GEN-1", "EV-TWO", MARKER),
            )
            .respond(
                200,
                &[],
                "\u{feff}Security Code,Issuer Name,LTP\n973123,ACME FINANCE LTD,101.25\n",
            )
    }

    #[tokio::test]
    async fn test_search_yields_second_token() {
        let transport = Arc::new(transcript());
        let client = client(transport.clone(), BseFetchMode::Export);

        let (token, mut cookies) = client.open_session().await.unwrap();
        assert_eq!(token.viewstate(), "VS-ONE");

        let outcome = client.submit_search(token, &mut cookies, date()).await.unwrap();
        let token2 = match outcome {
            SearchOutcome::Results { token, .. } => token,
            SearchOutcome::NoResults => panic!("expected results"),
        };

        assert_eq!(token2.viewstate(), "VS-TWO");
        assert_eq!(token2.viewstate_generator(), "GEN-1");
        assert_eq!(token2.event_validation(), "EV-TWO");
        assert_eq!(cookies.get("bm_sv"), Some("b2"));

        let requests = transport.requests();
        let search = &requests[1];
        assert_eq!(search.method, "POST");
        assert_eq!(search.field("__VIEWSTATE"), Some("VS-ONE"));
        assert_eq!(search.field("__EVENTVALIDATION"), Some("EV-ONE"));
        assert_eq!(search.field(SUBMIT_BUTTON.0), Some("Submit"));
        assert_eq!(search.header("Origin"), Some("https://www.bseindia.com"));
        assert_eq!(
            search.header("Referer"),
            Some("https://www.bseindia.com/markets/debt/DebtCorporateEOD.aspx")
        );
        assert_eq!(search.header("Cookie"), Some("ASP.NET_SessionId=s1; bm_sv=b1"));
    }

    #[tokio::test]
    async fn test_export_replays_second_token() {
        let transport = Arc::new(transcript());
        let client = client(transport.clone(), BseFetchMode::Export);

        let outcome = client.fetch(date()).await.unwrap();
        assert_eq!(
            outcome,
            Classification::DataPayload(
                "Security Code,Issuer Name,LTP\n973123,ACME FINANCE LTD,101.25".to_string()
            )
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);

        let export = &requests[2];
        assert_eq!(export.field("__VIEWSTATE"), Some("VS-TWO"));
        assert_eq!(export.field("__VIEWSTATEGENERATOR"), Some("GEN-1"));
        assert_eq!(export.field("__EVENTVALIDATION"), Some("EV-TWO"));
        assert_eq!(export.field("__EVENTTARGET"), Some(DOWNLOAD_CONTROL));
        assert_eq!(export.field(SUBMIT_BUTTON.0), None);
        assert_eq!(export.header("Cookie"), Some("ASP.NET_SessionId=s1; bm_sv=b2"));

        let date_fields: Vec<&str> = export
            .form
            .iter()
            .filter(|(_, v)| v.as_str() == "28/01/2026")
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(date_fields, vec![FIELD_FROM_DATE, FIELD_TO_DATE]);
        for (name, value) in SEARCH_SCOPE {
            assert_eq!(export.field(name), Some(*value));
        }
    }

    #[tokio::test]
    async fn test_missing_results_marker_short_circuits() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(
                    200,
                    &["ASP.NET_SessionId=s1"],
                    &form_page("VS-ONE", "GEN-1", "EV-ONE", ""),
                )
                .respond(
                    200,
                    &[],
                    &form_page("VS-TWO", "GEN-1", "EV-TWO", "<p>No Records Found</p>"),
                ),
        );
        let client = client(transport.clone(), BseFetchMode::Export);

        let outcome = client.fetch(date()).await.unwrap();
        assert_eq!(outcome, Classification::NoData(NoDataReason::NoResults));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_hidden_fields_is_drift() {
        let transport = Arc::new(
            ScriptedTransport::new().respond(200, &[], "<html><body>Maintenance</body></html>"),
        );
        let client = client(transport, BseFetchMode::Export);

        let err = client.fetch(date()).await.unwrap_err();
        assert!(matches!(err, IngestError::ProtocolDrift(_)));
    }

    #[tokio::test]
    async fn test_results_page_without_token_is_drift() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, &[], &form_page("VS-ONE", "GEN-1", "EV-ONE", ""))
                .respond(200, &[], &format!("<html><body>{}</body></html>", MARKER)),
        );
        let client = client(transport, BseFetchMode::Export);

        let err = client.fetch(date()).await.unwrap_err();
        assert!(matches!(err, IngestError::ProtocolDrift(_)));
    }

    #[tokio::test]
    async fn test_status_and_transport_failures() {
        let transport = Arc::new(ScriptedTransport::new().respond(503, &[], "busy"));
        let err = client(transport, BseFetchMode::Export).fetch(date()).await.unwrap_err();
        assert!(matches!(err, IngestError::UpstreamUnavailable(_)));

        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, &[], &form_page("VS-ONE", "GEN-1", "EV-ONE", ""))
                .fail("connection reset"),
        );
        let err = client(transport, BseFetchMode::Export).fetch(date()).await.unwrap_err();
        assert!(matches!(err, IngestError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_html_export_is_no_data() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, &[], &form_page("VS-ONE", "GEN-1", "EV-ONE", ""))
                .respond(200, &[], &form_page("VS-TWO", "GEN-1", "EV-TWO", MARKER))
                .respond(200, &[], "<!DOCTYPE html><html><body>Error</body></html>"),
        );
        let outcome = client(transport, BseFetchMode::Export).fetch(date()).await.unwrap();
        assert_eq!(outcome, Classification::NoData(NoDataReason::HtmlFallback));
    }

    #[tokio::test]
    async fn test_table_mode_reads_grid() {
        let grid = r#"<div id="ContentPlaceHolder1_divData">
            <table id="ContentPlaceHolder1_gvReport">
              <tr><th>Code</th></tr>
              <tr><td>973123</td><td>ACME FINANCE LTD</td><td>8.25</td><td>15/03/2030</td>
                  <td>101.25</td><td>1,234.50</td><td>12</td><td>AAA</td></tr>
            </table></div>"#;
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, &[], &form_page("VS-ONE", "GEN-1", "EV-ONE", ""))
                .respond(200, &[], &form_page("VS-TWO", "GEN-1", "EV-TWO", grid)),
        );
        let client = client(transport.clone(), BseFetchMode::Table);

        match client.fetch(date()).await.unwrap() {
            Classification::DataPayload(text) => {
                let row = "973123,ACME FINANCE LTD,8.25,15/03/2030,101.25,1234.50,12,AAA";
                assert!(text.ends_with(row));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(transport.requests().len(), 2);
    }
}
