use serde::{Deserialize, Serialize};

/// One saved movie as the MyMovies backend stores it. `id` is assigned by the
/// backend; `imdb_id` is the natural key used everywhere else.
///
/// Invariant kept by the store: `seen == false` exactly when `rating == 0`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovieEntry {
    pub id: i64,
    pub imdb_id: String,
    pub name: String,
    pub seen: bool,
    pub rating: u8,
}

/// One raw result as OMDb returns it inside a search page.
#[derive(Debug, Deserialize, Clone)]
pub struct SearchItem {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Type")]
    pub media_type: String,
    #[serde(rename = "Poster")]
    pub poster: String,
}

/// A search result annotated with collection membership. Only lives inside
/// the current page of a search session and is rebuilt on every fetch.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub title: String,
    pub year: String,
    pub imdb_id: String,
    pub media_type: String,
    pub poster: String,
    pub in_my_movies: bool,
}

impl SearchHit {
    pub fn from_item(item: SearchItem, in_my_movies: bool) -> Self {
        Self {
            title: item.title,
            year: item.year,
            imdb_id: item.imdb_id,
            media_type: item.media_type,
            poster: item.poster,
            in_my_movies,
        }
    }
}
