use crate::error::StoreError;
use crate::messages::Messages;
use crate::models::{SearchHit, SearchItem};
use crate::omdb::{OmdbApi, OmdbError, SearchQuery, SearchType, PAGE_SIZE};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Read-only view of the personal collection, injected so search results can
/// be flagged without the session owning collection state.
#[async_trait]
pub trait Membership: Send + Sync {
    async fn has_entry(&self, imdb_id: &str) -> bool;
}

/// Optional filters accepted by [`SearchSession::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub search_type: Option<String>,
    pub year: Option<String>,
}

/// State of the current catalog search: query, filters, the fetched page and
/// its position. `page == 0` means no search has completed yet.
///
/// Failed fetches never touch this state; the previous successful search
/// stays visible and the failure lands in the message log.
pub struct SearchSession {
    api: Arc<dyn OmdbApi>,
    membership: Arc<dyn Membership>,
    messages: Messages,
    movie: String,
    search_type: Option<SearchType>,
    year: String,
    results: Vec<SearchHit>,
    total_results: u32,
    page: u32,
}

impl SearchSession {
    pub fn new(api: Arc<dyn OmdbApi>, membership: Arc<dyn Membership>, messages: Messages) -> Self {
        Self {
            api,
            membership,
            messages,
            movie: String::new(),
            search_type: None,
            year: String::new(),
            results: Vec::new(),
            total_results: 0,
            page: 0,
        }
    }

    pub fn results(&self) -> &[SearchHit] {
        &self.results
    }

    pub fn total_results(&self) -> u32 {
        self.total_results
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn movie(&self) -> &str {
        &self.movie
    }

    /// Last valid page for the current result count. Derived, never stored:
    /// the catalog may revise the total on any fetch.
    pub fn last_page(&self) -> u32 {
        self.total_results.div_ceil(PAGE_SIZE)
    }

    /// Search the catalog by movie name, optionally filtered by media type
    /// and year. Validation failures raise before any network call; remote
    /// failures leave the session untouched and notify the user.
    pub async fn search(&mut self, name: &str, filters: &SearchFilters) -> Result<(), StoreError> {
        if name.is_empty() {
            return Err(StoreError::invalid_argument(
                "name",
                "Movie name must be set before searching!",
            ));
        }

        let search_type = parse_type_filter(filters.search_type.as_deref())?;
        let year = parse_year_filter(filters.year.as_deref())?;

        let query = SearchQuery {
            search_type,
            year: Some(year.clone()),
            page: None,
        };
        match self.api.search_by_name(name, &query).await {
            Ok(page) => {
                info!(
                    "Search for '{}' matched {} results",
                    name, page.total_results
                );
                self.results = self.annotate(page.items).await;
                self.total_results = page.total_results;
                self.movie = name.to_string();
                self.search_type = search_type;
                self.year = year;
                self.page = 1;
                Ok(())
            }
            Err(e) => {
                self.notify_failure("Searching", e).await;
                Ok(())
            }
        }
    }

    /// Fetch a specific page of the current search.
    pub async fn go_to_page(&mut self, page: u32) -> Result<(), StoreError> {
        if self.movie.is_empty() || self.page == 0 {
            return Err(StoreError::setup_call_missing(
                "search",
                "Method search() must first be called before go_to_page() can be called!",
            ));
        }
        if page == self.page {
            return Err(StoreError::invalid_argument(
                "page",
                "Argument 'page' must be a different page than what is currently set!",
            ));
        }
        if page < 1 {
            return Err(StoreError::invalid_argument(
                "page",
                "Argument 'page' cannot be less than one!",
            ));
        }
        if page > self.last_page() {
            return Err(StoreError::invalid_argument(
                "page",
                format!(
                    "Argument 'page' is out of bounds, it must be less than or equal to: {}",
                    self.last_page()
                ),
            ));
        }

        let query = SearchQuery {
            search_type: self.search_type,
            year: Some(self.year.clone()),
            page: Some(page),
        };
        match self.api.search_by_name(&self.movie, &query).await {
            Ok(fetched) => {
                self.results = self.annotate(fetched.items).await;
                self.total_results = fetched.total_results;
                self.page = page;
                Ok(())
            }
            Err(e) => {
                self.notify_failure("Changing page", e).await;
                Ok(())
            }
        }
    }

    /// Step back one page; fails with a plain error when already on page 1.
    pub async fn previous_page(&mut self) -> Result<(), StoreError> {
        if self.page <= 1 {
            return Err(StoreError::Failed(format!(
                "Current page is currently {}, there is no previous page.",
                self.page
            )));
        }
        self.go_to_page(self.page - 1).await
    }

    /// Step forward one page; fails with a plain error when already on the
    /// last page.
    pub async fn next_page(&mut self) -> Result<(), StoreError> {
        if self.page >= self.last_page() {
            return Err(StoreError::Failed(format!(
                "Current page is currently {}, and the final page is {}. There is no next page.",
                self.page,
                self.last_page()
            )));
        }
        self.go_to_page(self.page + 1).await
    }

    /// Recompute the collection flags of the current results. Called after
    /// the collection changed underneath an existing search.
    pub async fn refresh_annotations(&mut self) {
        for hit in &mut self.results {
            hit.in_my_movies = self.membership.has_entry(&hit.imdb_id).await;
        }
    }

    async fn annotate(&self, items: Vec<SearchItem>) -> Vec<SearchHit> {
        let mut hits = Vec::with_capacity(items.len());
        for item in items {
            let in_my_movies = self.membership.has_entry(&item.imdb_id).await;
            hits.push(SearchHit::from_item(item, in_my_movies));
        }
        hits
    }

    async fn notify_failure(&self, operation: &str, error: OmdbError) {
        let text = match error {
            OmdbError::InvalidApiKey { api_key } => {
                format!("{operation} failed because the used API key ({api_key}) is invalid.")
            }
            other => format!("{operation} failed because of an unknown error: {other}"),
        };
        self.messages.push(text).await;
    }
}

fn parse_type_filter(filter: Option<&str>) -> Result<Option<SearchType>, StoreError> {
    match filter {
        None | Some("") => Ok(None),
        Some(name) => SearchType::from_name(name).map(Some).ok_or_else(|| {
            let allowed = SearchType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            StoreError::invalid_argument("type", format!("Movie type must be any of: {allowed}"))
        }),
    }
}

fn parse_year_filter(filter: Option<&str>) -> Result<String, StoreError> {
    match filter {
        None => Ok(String::new()),
        Some(year) => {
            if !year.is_empty()
                && !(year.len() <= 4 && year.chars().all(|c| c.is_ascii_digit()))
            {
                return Err(StoreError::invalid_argument(
                    "year",
                    "Movie year must be between 0 - 9999!",
                ));
            }
            Ok(year.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_filter_accepts_known_names_and_empty() {
        assert_eq!(parse_type_filter(None).unwrap(), None);
        assert_eq!(parse_type_filter(Some("")).unwrap(), None);
        assert_eq!(
            parse_type_filter(Some("movie")).unwrap(),
            Some(SearchType::Movie)
        );
        assert_eq!(
            parse_type_filter(Some("series")).unwrap(),
            Some(SearchType::Series)
        );
    }

    #[test]
    fn type_filter_rejects_unknown_names() {
        let err = parse_type_filter(Some("episode")).unwrap_err();
        assert_eq!(err.to_string(), "Movie type must be any of: movie, series");
        match err {
            StoreError::InvalidArgument { argument, .. } => assert_eq!(argument, "type"),
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn year_filter_accepts_up_to_four_digits() {
        assert_eq!(parse_year_filter(Some("2015")).unwrap(), "2015");
        assert_eq!(parse_year_filter(Some("5")).unwrap(), "5");
        assert_eq!(parse_year_filter(Some("")).unwrap(), "");
        assert_eq!(parse_year_filter(None).unwrap(), "");
    }

    #[test]
    fn year_filter_rejects_non_digits_and_overlong_values() {
        for bad in ["20x5", "20155", "-201", "two thousand"] {
            let err = parse_year_filter(Some(bad)).unwrap_err();
            assert_eq!(err.to_string(), "Movie year must be between 0 - 9999!");
        }
    }
}
