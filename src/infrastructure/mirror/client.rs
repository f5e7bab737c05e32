//! HTTP client for mirror node list endpoints

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::pager::{Operator, SortOrder};

/// One bounded list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<'a> {
    /// Path below the base url, e.g. `/api/v1/transactions`
    pub path: &'a str,
    /// Query parameter carrying the ordering key, e.g. `timestamp`
    pub key_param: &'a str,
    pub key: Option<String>,
    pub operator: Operator,
    pub order: SortOrder,
    pub limit: usize,
    /// Fixed filters appended to every request
    pub filters: &'a [(String, String)],
}

#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: reqwest::Client,
    base_url: String,
}

impl MirrorClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list_url(&self, query: &ListQuery<'_>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, query.path))
            .with_context(|| format!("invalid mirror url {}{}", self.base_url, query.path))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query.filters {
                pairs.append_pair(name, value);
            }
            if let Some(key) = &query.key {
                pairs.append_pair(query.key_param, &format!("{}:{}", query.operator, key));
            }
            pairs.append_pair("order", query.order.as_str());
            pairs.append_pair("limit", &query.limit.to_string());
        }
        Ok(url)
    }

    /// Fetch one page and pull the rows out of the `field` array.
    ///
    /// A 404 means the listed entity does not exist, which the engine treats
    /// as a query it cannot answer (`None`).
    pub async fn list<T: DeserializeOwned>(
        &self,
        query: &ListQuery<'_>,
        field: &str,
    ) -> Result<Option<Vec<T>>> {
        let url = self.list_url(query)?;
        debug!(%url, "mirror request");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to query {url}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("Mirror node rejected {url}"))?;

        let mut body: Map<String, Value> = response
            .json()
            .await
            .context("Failed to parse mirror node response")?;
        let rows = body.remove(field).unwrap_or(Value::Array(Vec::new()));
        let rows = serde_json::from_value(rows)
            .with_context(|| format!("Unexpected {field} payload"))?;
        Ok(Some(rows))
    }
}
