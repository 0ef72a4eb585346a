use crate::models::MovieEntry;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::json;
use std::env;
use thiserror::Error;

const MYMOVIES_BASE: &str = "http://localhost:8080/api/movies";

#[derive(Debug, Error)]
pub enum MyMoviesError {
    /// The backend never answered (connection refused, DNS, timeout).
    #[error("MyMovies server could not be reached!")]
    Unreachable,
    /// The backend answered with an error payload, carried verbatim
    /// (e.g. `Movie already exists`).
    #[error("{0}")]
    Api(String),
}

#[async_trait]
pub trait MyMoviesApi: Send + Sync {
    async fn get_all_movies(&self) -> Result<Vec<MovieEntry>, MyMoviesError>;
    async fn get_movie(&self, imdb_id: &str) -> Result<MovieEntry, MyMoviesError>;
    async fn add_movie(&self, imdb_id: &str, name: &str) -> Result<(), MyMoviesError>;
    async fn delete_movie(&self, imdb_id: &str) -> Result<(), MyMoviesError>;
    async fn set_rating(&self, imdb_id: &str, rating: u8) -> Result<(), MyMoviesError>;
    async fn set_seen(&self, imdb_id: &str, rating: u8) -> Result<(), MyMoviesError>;
    async fn set_unseen(&self, imdb_id: &str) -> Result<(), MyMoviesError>;
}

#[derive(Debug, Clone)]
pub struct MyMoviesClient {
    client: Client,
    base_url: String,
}

impl MyMoviesClient {
    pub fn from_env() -> Self {
        let base_url = env::var("MYMOVIES_API_URL").unwrap_or_else(|_| MYMOVIES_BASE.to_string());
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, MyMoviesError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.map_err(|e| {
            tracing::error!("Could not reach MyMovies back-end: {}", e);
            MyMoviesError::Unreachable
        })?;
        let status = res.status();
        let text = res.text().await.map_err(|e| {
            tracing::error!("Could not read MyMovies response: {}", e);
            MyMoviesError::Unreachable
        })?;
        if !status.is_success() {
            return Err(MyMoviesError::Api(error_payload(status, text)));
        }
        Ok(text)
    }
}

/// Non-2xx bodies are the backend's own error text; keep them verbatim so
/// callers can match on messages like `Movie already exists`. An empty body
/// falls back to the status line.
fn error_payload(status: StatusCode, text: String) -> String {
    if text.is_empty() {
        status.to_string()
    } else {
        text
    }
}

#[async_trait]
impl MyMoviesApi for MyMoviesClient {
    async fn get_all_movies(&self) -> Result<Vec<MovieEntry>, MyMoviesError> {
        let text = self.call(Method::GET, "", None).await?;
        if text.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text)
            .map_err(|e| MyMoviesError::Api(format!("unexpected list payload: {e}")))
    }

    async fn get_movie(&self, imdb_id: &str) -> Result<MovieEntry, MyMoviesError> {
        let text = self.call(Method::GET, &format!("/{imdb_id}"), None).await?;
        serde_json::from_str(&text)
            .map_err(|e| MyMoviesError::Api(format!("unexpected movie payload: {e}")))
    }

    async fn add_movie(&self, imdb_id: &str, name: &str) -> Result<(), MyMoviesError> {
        self.call(
            Method::POST,
            "",
            Some(json!({ "imdbId": imdb_id, "name": name })),
        )
        .await?;
        Ok(())
    }

    async fn delete_movie(&self, imdb_id: &str) -> Result<(), MyMoviesError> {
        self.call(Method::DELETE, &format!("/{imdb_id}"), None)
            .await?;
        Ok(())
    }

    async fn set_rating(&self, imdb_id: &str, rating: u8) -> Result<(), MyMoviesError> {
        self.call(Method::PUT, &format!("/{imdb_id}/rating"), Some(json!(rating)))
            .await?;
        Ok(())
    }

    async fn set_seen(&self, imdb_id: &str, rating: u8) -> Result<(), MyMoviesError> {
        self.call(Method::PUT, &format!("/{imdb_id}/seen"), Some(json!(rating)))
            .await?;
        Ok(())
    }

    async fn set_unseen(&self, imdb_id: &str) -> Result<(), MyMoviesError> {
        self.call(Method::PUT, &format!("/{imdb_id}/unseen"), None)
            .await?;
        Ok(())
    }
}
