//! Network boundary. The dispatcher only ever talks to a [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::errors::Error;
use crate::request::HttpMethod;

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http_client: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(http_client: Client) -> Self {
        Self {
            http_client,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn map_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if err.is_timeout() => Error::Timeout(timeout),
            _ => Error::from(err),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        let TransportRequest {
            method,
            url,
            mut headers,
            body,
        } = request;
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));

        let mut builder = self.http_client.request(method.into(), &url);
        if let Some(body) = body {
            headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
            builder = builder.body(body);
        }
        builder = builder.headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(|e| self.map_error(e))?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
