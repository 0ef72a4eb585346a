use crate::error::StoreError;
use crate::messages::Messages;
use crate::models::MovieEntry;
use crate::mymovies::MyMoviesApi;
use crate::search::Membership;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Authoritative local mirror of the personal collection held by the
/// MyMovies backend. Every mutator calls the backend first and only touches
/// the local map once the call resolved, so a failure never leaves a
/// half-applied entry behind.
pub struct MyMoviesStore {
    api: Arc<dyn MyMoviesApi>,
    messages: Messages,
    movies: HashMap<String, MovieEntry>,
}

impl MyMoviesStore {
    pub fn new(api: Arc<dyn MyMoviesApi>, messages: Messages) -> Self {
        Self {
            api,
            messages,
            movies: HashMap::new(),
        }
    }

    pub fn movies(&self) -> &HashMap<String, MovieEntry> {
        &self.movies
    }

    pub fn has_entry(&self, imdb_id: &str) -> bool {
        self.movies.contains_key(imdb_id)
    }

    /// Replace the local map with the backend's current list. An empty list
    /// is a valid answer, not an error; a backend failure is reported to the
    /// user and keeps the previous map.
    pub async fn fetch_all_movies(&mut self) {
        match self.api.get_all_movies().await {
            Ok(records) => {
                info!("Fetched {} movies from the collection backend", records.len());
                self.movies = records
                    .into_iter()
                    .map(|m| (m.imdb_id.clone(), m))
                    .collect();
            }
            Err(e) => {
                self.messages
                    .push(format!("Listing failed because of an unknown error: {e}"))
                    .await;
            }
        }
    }

    /// Add a movie to the collection. Backend failures are passed through to
    /// the caller so it can tell a duplicate (`Movie already exists`) from
    /// anything else.
    pub async fn add_movie(&mut self, imdb_id: &str, name: &str) -> Result<(), StoreError> {
        require_non_empty(imdb_id, "imdbId")?;
        require_non_empty(name, "name")?;

        self.api.add_movie(imdb_id, name).await?;
        // The backend assigns the numeric id, so read the entry back.
        let entry = self.api.get_movie(imdb_id).await?;
        info!("Added '{}' ({}) to the collection", entry.name, imdb_id);
        self.movies.insert(entry.imdb_id.clone(), entry);
        Ok(())
    }

    /// Remove a movie from the collection. Backend failures are non-fatal
    /// and surface as a notification.
    pub async fn delete_movie(&mut self, imdb_id: &str) -> Result<(), StoreError> {
        require_non_empty(imdb_id, "imdbId")?;

        match self.api.delete_movie(imdb_id).await {
            Ok(()) => {
                self.movies.remove(imdb_id);
                info!("Removed '{}' from the collection", imdb_id);
            }
            Err(e) => {
                self.messages
                    .push(format!(
                        "Deleting movie failed because of the following error: {e}"
                    ))
                    .await;
            }
        }
        Ok(())
    }

    /// Rate a movie. `seen` is the entry's current state: rating a movie
    /// that was unseen is a different backend operation than re-rating one
    /// already seen, even though the local effect is the same.
    pub async fn set_movie_rating(
        &mut self,
        imdb_id: &str,
        rating: u8,
        seen: bool,
    ) -> Result<(), StoreError> {
        require_non_empty(imdb_id, "imdbId")?;
        if !(1..=10).contains(&rating) {
            return Err(StoreError::invalid_argument(
                "rating",
                "Argument 'rating' must be between 1 and 10!",
            ));
        }

        let call = if seen {
            self.api.set_rating(imdb_id, rating).await
        } else {
            self.api.set_seen(imdb_id, rating).await
        };
        match call {
            Ok(()) => {
                if let Some(entry) = self.movies.get_mut(imdb_id) {
                    entry.rating = rating;
                    if !seen {
                        entry.seen = true;
                    }
                }
            }
            Err(e) => {
                self.messages
                    .push(format!(
                        "Updating movie rating failed because of the following error: {e}"
                    ))
                    .await;
            }
        }
        Ok(())
    }

    /// Mark a movie as not seen, which also clears its rating.
    pub async fn set_movie_unseen(&mut self, imdb_id: &str) -> Result<(), StoreError> {
        require_non_empty(imdb_id, "imdbId")?;

        match self.api.set_unseen(imdb_id).await {
            Ok(()) => {
                if let Some(entry) = self.movies.get_mut(imdb_id) {
                    entry.rating = 0;
                    entry.seen = false;
                }
            }
            Err(e) => {
                self.messages
                    .push(format!(
                        "Updating movie seen failed because of the following error: {e}"
                    ))
                    .await;
            }
        }
        Ok(())
    }
}

fn require_non_empty(value: &str, argument: &'static str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::invalid_argument(
            argument,
            format!("Argument '{argument}' is too short!"),
        ));
    }
    Ok(())
}

/// Shared handle over the store, usable as the search session's read-only
/// membership view.
#[derive(Clone)]
pub struct SharedMovies(pub Arc<Mutex<MyMoviesStore>>);

impl SharedMovies {
    pub fn new(store: MyMoviesStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }
}

#[async_trait]
impl Membership for SharedMovies {
    async fn has_entry(&self, imdb_id: &str) -> bool {
        self.0.lock().await.has_entry(imdb_id)
    }
}
