//! HTTP client for a Prismic-style REST content API.

use crate::normalize;
use crate::raw::{RawApi, RawSearchResponse};
use crate::{ContentSource, QueryOptions, is_valid_uid};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use spacetraveling_core::config::CmsConfig;
use spacetraveling_core::{FeedPage, FetchError, PageSource, PostDetail};
use tokio::sync::OnceCell;

/// Content API client.
///
/// Construct one per build or preview session and pass it to whatever needs
/// it. The repository's master ref is resolved on first use and reused for
/// every query made through this instance.
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    pub fn new(config: &CmsConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token(),
            master_ref: OnceCell::new(),
        })
    }

    /// Override the credential (tests and callers that manage tokens themselves)
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn master_ref(&self) -> Result<&str, FetchError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let url = self.url(&self.endpoint)?;
                let api: RawApi = self.get_json(url).await?;
                api.master_ref().map(str::to_string).ok_or_else(|| {
                    FetchError::Parse("repository has no master ref".to_string())
                })
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn search(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<RawSearchResponse, FetchError> {
        let reference = self.master_ref().await?;
        let mut url = self.url(&format!("{}/documents/search", self.endpoint))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            pairs.append_pair("q", query);
            pairs.append_pair("pageSize", &options.page_size.to_string());
            if !options.fetch_fields.is_empty() {
                pairs.append_pair("fetch", &options.fetch_fields.join(","));
            }
        }
        self.get_json(url).await
    }

    /// Parse `raw`, adding the access token unless the URL already carries one
    fn url(&self, raw: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(raw)
            .map_err(|e| FetchError::Parse(format!("invalid URL '{}': {}", raw, e)))?;
        if let Some(ref token) = self.access_token {
            let has_token = url.query_pairs().any(|(key, _)| key == "access_token");
            if !has_token {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::debug!(path = url.path(), "GET content API");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Content API returned error status");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PageSource for PrismicClient {
    /// The cursor is the `next_page` URL the API handed out
    async fn fetch_page(&self, cursor: &str) -> Result<FeedPage, FetchError> {
        let url = self.url(cursor)?;
        let response: RawSearchResponse = self.get_json(url).await?;
        Ok(normalize::feed_page(response))
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query_by_type(
        &self,
        doc_type: &str,
        options: &QueryOptions,
    ) -> Result<FeedPage, FetchError> {
        let query = format!("[[at(document.type,\"{}\")]]", doc_type);
        let response = self.search(&query, options).await?;
        Ok(normalize::feed_page(response))
    }

    async fn query_by_uid(&self, doc_type: &str, uid: &str) -> Result<PostDetail, FetchError> {
        if !is_valid_uid(uid) {
            return Err(FetchError::NotFound(uid.to_string()));
        }

        let query = format!("[[at(my.{}.uid,\"{}\")]]", doc_type, uid);
        let options = QueryOptions {
            fetch_fields: Vec::new(),
            page_size: 1,
        };
        let response = self.search(&query, &options).await?;

        response
            .results
            .into_iter()
            .find_map(normalize::post_detail)
            .ok_or_else(|| FetchError::NotFound(uid.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}
