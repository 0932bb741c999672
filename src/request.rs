//! Replayable description of one API call.
//!
//! A [`RequestDescriptor`] is plain data: the recovery controller resends the
//! very same value after a handshake, so nothing here may depend on session
//! state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// GET and DELETE carry their payload as query parameters.
    pub fn uses_query(self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attaches a payload, serialized up front so the descriptor stays replayable.
    pub fn with_payload<P: Serialize + ?Sized>(mut self, payload: &P) -> Result<Self, Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Query string for query-bearing methods, without the leading `?`.
    pub(crate) fn query_string(&self) -> Result<Option<String>, Error> {
        match &self.payload {
            Some(payload) if self.method.uses_query() => encode_query(payload),
            _ => Ok(None),
        }
    }

    /// JSON body for body-bearing methods. A missing payload is sent as `null`.
    pub(crate) fn json_body(&self) -> Result<Option<Vec<u8>>, Error> {
        if self.method.uses_query() {
            return Ok(None);
        }
        let value = self.payload.as_ref().unwrap_or(&Value::Null);
        Ok(Some(serde_json::to_vec(value)?))
    }
}

fn encode_query(payload: &Value) -> Result<Option<String>, Error> {
    let map = match payload {
        Value::Null => return Ok(None),
        Value::Object(map) => map,
        other => {
            return Err(Error::Serialization(format!(
                "query payload must be an object, got {}",
                json_type(other)
            )));
        }
    };
    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        let encoded_key = urlencoding::encode(key);
        let values = match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        };
        for value in values {
            if let Some(scalar) = query_scalar(key, value)? {
                pairs.push(format!("{}={}", encoded_key, urlencoding::encode(&scalar)));
            }
        }
    }
    if pairs.is_empty() {
        Ok(None)
    } else {
        Ok(Some(pairs.join("&")))
    }
}

fn query_scalar(key: &str, value: &Value) -> Result<Option<String>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(Error::Serialization(format!(
            "query parameter '{key}' cannot be {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
