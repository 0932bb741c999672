use std::fmt;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Structured error body returned by the API on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: String::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Parses an error body. An empty body yields an empty error.
    pub fn from_body(body: &[u8]) -> Result<Self, Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (true, true) => write!(f, "<no error body>"),
            (false, true) => write!(f, "{}", self.code),
            (true, false) => write!(f, "{}", self.message),
            (false, false) => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Failure(ApiError),
}

/// Normalized result of one dispatched request.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    outcome: ResponseStatus,
}

impl Response {
    /// Builds a response, parsing the error body when `status >= 400`.
    pub fn from_parts(status: u16, headers: HeaderMap, body: Bytes) -> Result<Self, Error> {
        let outcome = if status >= 400 {
            ResponseStatus::Failure(ApiError::from_body(&body)?)
        } else {
            ResponseStatus::Success
        };
        Ok(Self {
            status,
            headers,
            body,
            outcome,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string; missing or non-UTF-8 values yield `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn outcome(&self) -> &ResponseStatus {
        &self.outcome
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseStatus::Success)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match &self.outcome {
            ResponseStatus::Failure(err) => Some(err),
            ResponseStatus::Success => None,
        }
    }

    /// Error code of a failed response, empty on success.
    pub fn error_code(&self) -> &str {
        self.error().map(|e| e.code.as_str()).unwrap_or_default()
    }

    /// Deserializes the body of a successful response. An empty body reads as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        match &self.outcome {
            ResponseStatus::Success if self.body.iter().all(u8::is_ascii_whitespace) => {
                Ok(serde_json::from_slice(b"null")?)
            }
            ResponseStatus::Success => Ok(serde_json::from_slice(&self.body)?),
            ResponseStatus::Failure(err) => Err(Error::Protocol {
                status: self.status,
                error: err.clone(),
            }),
        }
    }

    /// Converts an unrecovered failure into [`Error::Protocol`].
    pub fn into_result(self) -> Result<Self, Error> {
        match &self.outcome {
            ResponseStatus::Success => Ok(self),
            ResponseStatus::Failure(err) => Err(Error::Protocol {
                status: self.status,
                error: err.clone(),
            }),
        }
    }
}
