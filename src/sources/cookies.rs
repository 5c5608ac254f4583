/// Session cookie jar for one fetch attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    pairs: Vec<(String, String)>,
}

impl SessionCookies {
    pub fn new() -> Self {
        SessionCookies { pairs: Vec::new() }
    }

    /// Take in `Set-Cookie` header values. Known names are updated in place.
    pub fn absorb<S: AsRef<str>>(&mut self, set_cookie_headers: &[S]) {
        for header in set_cookie_headers {
            if let Some((name, value)) = parse_set_cookie(header.as_ref()) {
                match self.pairs.iter_mut().find(|(n, _)| *n == name) {
                    Some(existing) => existing.1 = value,
                    None => self.pairs.push((name, value)),
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `Cookie` request header value, `None` when the jar is empty
    pub fn header_value(&self) -> Option<String> {
        if self.pairs.is_empty() {
            return None;
        }

        Some(
            self.pairs
                .iter()
                .map(|(n, v)| format!("{}={}", n, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// `name=value` from the first segment of a `Set-Cookie` value; attributes are ignored
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
