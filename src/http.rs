//! One-shot HTTP JSON exchanges.
//!
//! Alongside the long-lived channel, simple fetches go over plain HTTP(S):
//! `GET` a path and decode the JSON body, or `POST` a JSON body and decode
//! the reply. Both run every body through the same schema layer as the
//! channel, and both accept caller options merged over the client's
//! defaults.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::schema;

// ============================================================================
// RequestOptions
// ============================================================================

/// Per-request transport options.
///
/// Options given at call time are merged over the client's defaults: a
/// caller timeout replaces the default one, caller headers are applied on
/// top of default headers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Maximum time for the whole exchange.
    pub timeout: Option<Duration>,
    /// Extra request headers as name/value pairs.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Creates empty options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exchange timeout.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a request header.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Merges `self` over `defaults`.
    #[must_use]
    fn merged_over(&self, defaults: &Self) -> Self {
        let mut headers = defaults.headers.clone();
        headers.extend(self.headers.iter().cloned());

        Self {
            timeout: self.timeout.or(defaults.timeout),
            headers,
        }
    }
}

// ============================================================================
// Http
// ============================================================================

/// HTTP client bound to the server's base URL.
pub struct Http {
    /// Base URL all paths are joined against.
    base: Url,
    /// Shared reqwest client.
    client: Client,
    /// Options applied to every request unless overridden.
    defaults: RequestOptions,
}

impl Http {
    /// Creates a client for the given base URL with empty defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `base` does not parse as an
    /// `http://` or `https://` URL.
    pub fn new(base: impl AsRef<str>) -> Result<Self> {
        Self::with_defaults(base, RequestOptions::default())
    }

    /// Creates a client with default options for every request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `base` does not parse as an
    /// `http://` or `https://` URL.
    pub fn with_defaults(base: impl AsRef<str>, defaults: RequestOptions) -> Result<Self> {
        let base = base.as_ref();
        let parsed = Url::parse(base).map_err(|_| Error::invalid_url(base))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::invalid_url(base));
        }

        Ok(Self {
            base: parsed,
            client: Client::new(),
            defaults,
        })
    }

    /// Fetches `path` and decodes the JSON body as `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] on transport or status failure
    /// - [`Error::Decode`] if the body does not match `T`'s schema
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<RequestOptions>,
    ) -> Result<T> {
        let url = self.join(path)?;
        debug!(%url, "GET");

        let request = self.apply_options(self.client.get(url), options);
        Self::decode_response(request).await
    }

    /// Posts `body` as JSON to `path` and decodes the reply as `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] on transport or status failure
    /// - [`Error::Decode`] if the reply does not match `T`'s schema
    pub async fn post<T: DeserializeOwned, P: Serialize>(
        &self,
        path: &str,
        body: &P,
        options: Option<RequestOptions>,
    ) -> Result<T> {
        let url = self.join(path)?;
        debug!(%url, "POST");

        let request = self.apply_options(self.client.post(url).json(body), options);
        Self::decode_response(request).await
    }

    /// Joins a path against the base URL.
    fn join(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|_| Error::invalid_url(format!("{}{path}", self.base)))
    }

    /// Applies merged options to a request builder.
    fn apply_options(
        &self,
        mut request: RequestBuilder,
        options: Option<RequestOptions>,
    ) -> RequestBuilder {
        let merged = options
            .unwrap_or_default()
            .merged_over(&self.defaults);

        if let Some(timeout) = merged.timeout {
            request = request.timeout(timeout);
        }
        for (name, value) in merged.headers {
            request = request.header(name, value);
        }

        request
    }

    /// Runs the exchange and decodes the JSON body.
    async fn decode_response<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?.error_for_status()?;
        let raw: Value = response.json().await?;
        Ok(schema::decode(raw)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
