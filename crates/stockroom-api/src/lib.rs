// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stockroom_app::{Category, Item, ItemId, ItemPage, ItemPatch, ItemStatus, ItemsApi};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking client for the inventory REST API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = validate_base_url(base_url)?;
        if timeout.is_zero() {
            bail!("api.timeout must be greater than zero");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Confirms the server answers a one-row item query.
    pub fn ping(&self) -> Result<()> {
        self.fetch_items(1, stockroom_app::FIRST_CURSOR)
            .map(|_| ())
            .with_context(|| format!("check inventory API at {}", self.base_url))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, self.timeout, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }
}

impl ItemsApi for Client {
    fn fetch_items(&self, take: usize, cursor: i64) -> Result<ItemPage> {
        debug!(take, cursor, "GET /items");
        let response = self.send(
            self.http
                .get(self.endpoint("/items"))
                .query(&ItemsQuery { take, cursor }),
        )?;
        response.json().context("decode item page")
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item> {
        debug!("PUT /items/{id}");
        let response = self.send(
            self.http
                .put(self.endpoint(&format!("/items/{id}")))
                .json(patch),
        )?;
        response
            .json()
            .with_context(|| format!("decode updated item {id}"))
    }

    fn bulk_update_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<()> {
        debug!(count = ids.len(), status = status.as_str(), "PATCH /items/bulk/status");
        self.send(
            self.http
                .patch(self.endpoint("/items/bulk/status"))
                .json(&BulkStatusRequest { ids, status }),
        )?;
        Ok(())
    }

    fn fetch_categories(&self) -> Result<Vec<Category>> {
        debug!("GET /categories");
        let response = self.send(self.http.get(self.endpoint("/categories")))?;
        response.json().context("decode category list")
    }
}

pub fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("api.base_url must not be empty");
    }
    let parsed = Url::parse(trimmed)
        .with_context(|| format!("api.base_url {trimmed:?} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "api.base_url must use http or https, got {:?}",
            parsed.scheme()
        );
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        bail!("api.base_url must not carry a query or fragment");
    }
    Ok(trimmed.to_owned())
}

fn connection_error(base_url: &str, timeout: Duration, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "request to {} timed out after {}s",
            base_url,
            timeout.as_secs_f64()
        );
    }
    anyhow!(
        "cannot reach {} -- is the inventory server running? ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<MessageEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct ItemsQuery {
    take: usize,
    cursor: i64,
}

#[derive(Debug, Serialize)]
struct BulkStatusRequest<'a> {
    ids: &'a [ItemId],
    status: ItemStatus,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
