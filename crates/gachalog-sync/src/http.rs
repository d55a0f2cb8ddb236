//! HTTP client for the vendor's gacha config and gacha log endpoints.

use std::time::Duration;

use gachalog_core::{ApiConfig, DecodeError, DrawRecord, FieldPolicy, PoolDescriptor};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("response carried no data (retcode {retcode:?}: {message}); the authorization URL has probably expired")]
    MissingData {
        retcode: Option<i64>,
        message: String,
    },
    #[error("draw record could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}

/// Query parameters lifted from an authorization URL.
///
/// The pairs (authkey, signature, region, timestamps, ...) are forwarded
/// verbatim on every call and never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedQuery {
    pairs: Vec<(String, String)>,
}

impl AuthorizedQuery {
    /// Parse the query string of `auth_url`.
    ///
    /// An empty URL yields an empty query; the vendor then rejects the calls
    /// instead of us failing locally.
    pub fn parse(auth_url: &str) -> Result<Self, SyncError> {
        let auth_url = auth_url.trim();
        if auth_url.is_empty() {
            return Ok(Self::default());
        }
        let url = Url::parse(auth_url).map_err(|e| SyncError::InvalidUrl {
            url: auth_url.to_string(),
            reason: e.to_string(),
        })?;
        let pairs = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Every vendor response is wrapped the same way; `data` is null on failure.
#[derive(Deserialize)]
struct Envelope<T> {
    retcode: Option<i64>,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct ConfigData {
    gacha_type_list: Vec<PoolDescriptor>,
}

#[derive(Deserialize)]
struct LogPage {
    list: Vec<Value>,
}

/// Client for the two endpoints the pipeline needs.
pub struct GachaClient {
    client: reqwest::Client,
    config_url: String,
    log_url: String,
    page_size: u32,
    request_delay: Duration,
    field_policy: FieldPolicy,
}

impl GachaClient {
    pub fn new(api: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config_url: api.config_url.clone(),
            log_url: api.log_url.clone(),
            page_size: api.page_size,
            request_delay: api.request_delay,
            field_policy: api.field_policy,
        }
    }

    /// List the pools the account can query.
    ///
    /// A body that does not have the expected shape yields an empty list;
    /// only transport failures and error statuses are returned as errors.
    /// A non-2xx status is `SyncError::Server` and stops the run.
    pub async fn pool_types(&self, query: &AuthorizedQuery) -> Result<Vec<PoolDescriptor>, SyncError> {
        let url = endpoint(&self.config_url, query, &[])?;
        let body = self.get_body(url).await?;

        match serde_json::from_str::<Envelope<ConfigData>>(&body) {
            Ok(Envelope {
                data: Some(data), ..
            }) => {
                info!(count = data.gacha_type_list.len(), "fetched pool types");
                Ok(data.gacha_type_list)
            }
            Ok(envelope) => {
                warn!(
                    retcode = ?envelope.retcode,
                    message = envelope.message.as_deref().unwrap_or(""),
                    "config response carried no pool list"
                );
                Ok(Vec::new())
            }
            Err(e) => {
                warn!(error = %e, "unexpected config response shape");
                Ok(Vec::new())
            }
        }
    }

    /// Page through a pool's whole history, newest first.
    ///
    /// Sleeps for the configured delay before every request. `on_page` is
    /// called with the 1-based page number just before each request.
    pub async fn fetch_history(
        &self,
        query: &AuthorizedQuery,
        gacha_type: &str,
        mut on_page: impl FnMut(u32),
    ) -> Result<Vec<DrawRecord>, SyncError> {
        let mut records = Vec::new();
        let mut end_id = String::from("0");
        let mut page = 1;

        loop {
            tokio::time::sleep(self.request_delay).await;
            on_page(page);

            let batch = self.fetch_page(query, gacha_type, page, &end_id).await?;
            let Some(last) = batch.last() else {
                break;
            };
            end_id = last.id.clone();
            debug!(gacha_type, page, count = batch.len(), end_id = %end_id, "fetched page");

            records.extend(batch);
            page += 1;
        }

        info!(gacha_type, count = records.len(), "fetched pool history");
        Ok(records)
    }

    /// Fetch one page of history ending before `end_id` ("0" for the newest).
    pub async fn fetch_page(
        &self,
        query: &AuthorizedQuery,
        gacha_type: &str,
        page: u32,
        end_id: &str,
    ) -> Result<Vec<DrawRecord>, SyncError> {
        let page = page.to_string();
        let size = self.page_size.to_string();
        let url = endpoint(
            &self.log_url,
            query,
            &[
                ("gacha_type", gacha_type),
                ("page", &page),
                ("size", &size),
                ("end_id", end_id),
            ],
        )?;
        let body = self.get_body(url).await?;

        let envelope: Envelope<LogPage> = serde_json::from_str(&body)?;
        let Some(data) = envelope.data else {
            return Err(SyncError::MissingData {
                retcode: envelope.retcode,
                message: envelope.message.unwrap_or_default(),
            });
        };
        Ok(DrawRecord::from_values(data.list, self.field_policy)?)
    }

    async fn get_body(&self, url: Url) -> Result<String, SyncError> {
        // The query carries the authkey, so only the path is logged.
        debug!(path = url.path(), "GET");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }
}

fn endpoint(base: &str, query: &AuthorizedQuery, extra: &[(&str, &str)]) -> Result<Url, SyncError> {
    let mut url = Url::parse(base).map_err(|e| SyncError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query.pairs() {
            pairs.append_pair(k, v);
        }
        for (k, v) in extra {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}
