use crate::models::SearchItem;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use thiserror::Error;

const OMDB_BASE: &str = "https://www.omdbapi.com";

/// OMDb serves fixed-size pages of this many results.
pub const PAGE_SIZE: u32 = 10;

/// Media types OMDb can filter a search by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Movie,
    Series,
}

impl SearchType {
    pub const ALL: [SearchType; 2] = [SearchType::Movie, SearchType::Series];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Movie => "movie",
            SearchType::Series => "series",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// Optional filters for one search request.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub search_type: Option<SearchType>,
    pub year: Option<String>,
    pub page: Option<u32>,
}

/// One page of search results plus the catalog-wide match count.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub items: Vec<SearchItem>,
    pub total_results: u32,
}

#[derive(Debug, Error)]
pub enum OmdbError {
    /// OMDb rejected the configured key (its `Invalid API key!` sentinel).
    #[error("Invalid API key!")]
    InvalidApiKey { api_key: String },
    /// Any other error payload OMDb reported; carried verbatim.
    #[error("{0}")]
    Api(String),
    /// The request never produced a parseable OMDb response.
    #[error("{0}")]
    Transport(String),
}

#[async_trait]
pub trait OmdbApi: Send + Sync {
    async fn search_by_name(
        &self,
        name: &str,
        query: &SearchQuery,
    ) -> Result<SearchPage, OmdbError>;

    /// The key in use, surfaced in invalid-key notifications.
    fn api_key(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OmdbClient {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OMDB_API_KEY").context("OMDB_API_KEY not set")?;
        let base_url = env::var("OMDB_API_URL").unwrap_or_else(|_| OMDB_BASE.to_string());
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl OmdbApi for OmdbClient {
    async fn search_by_name(
        &self,
        name: &str,
        query: &SearchQuery,
    ) -> Result<SearchPage, OmdbError> {
        let url = format!(
            "{}/?{}",
            self.base_url,
            build_query(&self.api_key, name, query)
        );
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OmdbError::Transport(format!("request failed: {e}")))?;
        let text = res
            .text()
            .await
            .map_err(|e| OmdbError::Transport(format!("reading body failed: {e}")))?;
        let raw: RawResponse = serde_json::from_str(&text)
            .map_err(|e| OmdbError::Transport(format!("JSON parse failed: {e}")))?;
        parse_response(raw, &self.api_key)
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<SearchItem>,
    #[serde(rename = "totalResults")]
    total_results: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

fn build_query(api_key: &str, name: &str, query: &SearchQuery) -> String {
    let mut parts = vec![
        format!("apikey={api_key}"),
        format!("s={}", urlencoding::encode(name)),
    ];
    if let Some(t) = query.search_type {
        parts.push(format!("type={}", t.as_str()));
    }
    if let Some(year) = query.year.as_deref().filter(|y| !y.is_empty()) {
        parts.push(format!("y={year}"));
    }
    if let Some(page) = query.page {
        parts.push(format!("page={page}"));
    }
    parts.join("&")
}

fn parse_response(raw: RawResponse, api_key: &str) -> Result<SearchPage, OmdbError> {
    if raw.response != "True" {
        let error = raw.error.unwrap_or_else(|| "unknown error".to_string());
        if error == "Invalid API key!" {
            return Err(OmdbError::InvalidApiKey {
                api_key: api_key.to_string(),
            });
        }
        return Err(OmdbError::Api(error));
    }
    let total_results = raw
        .total_results
        .as_deref()
        .and_then(|t| t.parse::<u32>().ok())
        .unwrap_or(0);
    Ok(SearchPage {
        items: raw.search,
        total_results,
    })
}
