use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::config::HeaderNames;
use crate::errors::Error;

/// Tokens and identity of one client session. Empty strings mean "absent".
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    base_url: String,
    user_agent: Option<String>,
    access_token: String,
    refresh_token: String,
    csrf_token: String,
}

impl SessionState {
    pub fn new(base_url: impl Into<String>, user_agent: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: user_agent.filter(|ua| !ua.is_empty()),
            ..Self::default()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    pub fn set_refresh_token(&mut self, token: impl Into<String>) {
        self.refresh_token = token.into();
    }

    pub fn set_csrf_token(&mut self, token: impl Into<String>) {
        self.csrf_token = token.into();
    }

    /// Drops every token; base URL and user agent are kept.
    pub fn clear_tokens(&mut self) {
        self.access_token.clear();
        self.refresh_token.clear();
        self.csrf_token.clear();
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds outbound headers: session tokens, user agent, then caller headers.
    /// Caller headers never replace a token header the session already set.
    pub fn outbound_headers(
        &self,
        names: &HeaderNames,
        extra: &[(String, String)],
    ) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if !self.access_token.is_empty() {
            headers.insert(header_name(&names.access_token)?, header_value(&self.access_token)?);
        }
        if !self.csrf_token.is_empty() {
            headers.insert(header_name(&names.csrf_token)?, header_value(&self.csrf_token)?);
        }
        let protected: Vec<HeaderName> = headers.keys().cloned().collect();
        if let Some(ua) = &self.user_agent {
            headers.insert(USER_AGENT, header_value(ua)?);
        }
        for (name, value) in extra {
            let name = header_name(name)?;
            if protected.contains(&name) {
                continue;
            }
            headers.insert(name, header_value(value)?);
        }
        Ok(headers)
    }

    /// Stores every non-empty token found in `headers`. Returns whether anything changed.
    pub fn capture(&mut self, names: &HeaderNames, headers: &HeaderMap) -> bool {
        let mut changed = false;
        if let Some(token) = non_empty(headers, &names.access_token) {
            changed |= replace(&mut self.access_token, token);
        }
        if let Some(token) = non_empty(headers, &names.refresh_token) {
            changed |= replace(&mut self.refresh_token, token);
        }
        if let Some(token) = non_empty(headers, &names.csrf_token) {
            changed |= replace(&mut self.csrf_token, token);
        }
        changed
    }
}

fn non_empty<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn replace(slot: &mut String, token: &str) -> bool {
    if slot == token {
        return false;
    }
    *slot = token.to_string();
    true
}

fn header_name(name: &str) -> Result<HeaderName, Error> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::Serialization(format!("invalid header name '{name}': {e}")))
}

fn header_value(value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Serialization(format!("invalid header value: {e}")))
}
