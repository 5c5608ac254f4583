/// Scripted transport replaying canned responses in order
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::transport::{HttpResponse, HttpTransport};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.form.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, set_cookies: &[&str], body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            set_cookies: set_cookies.iter().map(|c| c.to_string()).collect(),
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(IngestError::UpstreamUnavailable(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: RecordedRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(IngestError::UpstreamUnavailable("script exhausted".to_string()))
            })
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        self.next(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            headers: headers.to_vec(),
            form: Vec::new(),
        })
    }

    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        form: &[(String, String)],
    ) -> Result<HttpResponse> {
        self.next(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            headers: headers.to_vec(),
            form: form.to_vec(),
        })
    }
}

/// Search page carrying the given hidden-field values
pub(crate) fn form_page(viewstate: &str, generator: &str, validation: &str, extra: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body><form method="post" id="form1">
<input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="{}" />
<input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="{}" />
<input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="{}" />
{}
</form></body></html>"#,
        viewstate, generator, validation, extra
    )
}
