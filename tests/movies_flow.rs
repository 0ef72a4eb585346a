use async_trait::async_trait;
use filmlog::error::StoreError;
use filmlog::messages::Messages;
use filmlog::models::MovieEntry;
use filmlog::movies::MyMoviesStore;
use filmlog::mymovies::{MyMoviesApi, MyMoviesError};
use std::sync::{Arc, Mutex};

fn entry(id: i64, imdb_id: &str, name: &str, seen: bool, rating: u8) -> MovieEntry {
    MovieEntry {
        id,
        imdb_id: imdb_id.to_string(),
        name: name.to_string(),
        seen,
        rating,
    }
}

fn seed() -> Vec<MovieEntry> {
    vec![
        entry(1, "tt2015381", "Guardians of the Galaxy", true, 10),
        entry(2, "tt0800369", "Thor", true, 5),
        entry(3, "tt2948356", "Zootopia", false, 0),
        entry(4, "tt4154756", "Avengers: Infinity War", true, 2),
    ]
}

/// Backend fake holding the same table the real service would. New entries
/// start unseen with rating 0 and get the next numeric id.
struct FakeBackend {
    db: Mutex<Vec<MovieEntry>>,
    next_id: Mutex<i64>,
    unreachable: Mutex<bool>,
}

impl FakeBackend {
    fn new(rows: Vec<MovieEntry>) -> Self {
        let next_id = rows.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        Self {
            db: Mutex::new(rows),
            next_id: Mutex::new(next_id),
            unreachable: Mutex::new(false),
        }
    }

    fn set_unreachable(&self, value: bool) {
        *self.unreachable.lock().unwrap() = value;
    }

    fn check_reachable(&self) -> Result<(), MyMoviesError> {
        if *self.unreachable.lock().unwrap() {
            return Err(MyMoviesError::Unreachable);
        }
        Ok(())
    }
}

#[async_trait]
impl MyMoviesApi for FakeBackend {
    async fn get_all_movies(&self) -> Result<Vec<MovieEntry>, MyMoviesError> {
        self.check_reachable()?;
        Ok(self.db.lock().unwrap().clone())
    }

    async fn get_movie(&self, imdb_id: &str) -> Result<MovieEntry, MyMoviesError> {
        self.check_reachable()?;
        self.db
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.imdb_id == imdb_id)
            .cloned()
            .ok_or_else(|| MyMoviesError::Api("Movie not found".to_string()))
    }

    async fn add_movie(&self, imdb_id: &str, name: &str) -> Result<(), MyMoviesError> {
        self.check_reachable()?;
        let mut db = self.db.lock().unwrap();
        if db.iter().any(|m| m.imdb_id == imdb_id) {
            return Err(MyMoviesError::Api("Movie already exists".to_string()));
        }
        let mut next_id = self.next_id.lock().unwrap();
        db.push(entry(*next_id, imdb_id, name, false, 0));
        *next_id += 1;
        Ok(())
    }

    async fn delete_movie(&self, imdb_id: &str) -> Result<(), MyMoviesError> {
        self.check_reachable()?;
        self.db.lock().unwrap().retain(|m| m.imdb_id != imdb_id);
        Ok(())
    }

    async fn set_rating(&self, imdb_id: &str, rating: u8) -> Result<(), MyMoviesError> {
        self.check_reachable()?;
        for m in self.db.lock().unwrap().iter_mut() {
            if m.imdb_id == imdb_id {
                m.rating = rating;
            }
        }
        Ok(())
    }

    async fn set_seen(&self, imdb_id: &str, rating: u8) -> Result<(), MyMoviesError> {
        self.check_reachable()?;
        for m in self.db.lock().unwrap().iter_mut() {
            if m.imdb_id == imdb_id {
                m.seen = true;
                m.rating = rating;
            }
        }
        Ok(())
    }

    async fn set_unseen(&self, imdb_id: &str) -> Result<(), MyMoviesError> {
        self.check_reachable()?;
        for m in self.db.lock().unwrap().iter_mut() {
            if m.imdb_id == imdb_id {
                m.seen = false;
                m.rating = 0;
            }
        }
        Ok(())
    }
}

fn store_with(rows: Vec<MovieEntry>) -> (MyMoviesStore, Arc<FakeBackend>, Messages) {
    let backend = Arc::new(FakeBackend::new(rows));
    let messages = Messages::new();
    let store = MyMoviesStore::new(backend.clone(), messages.clone());
    (store, backend, messages)
}

fn assert_seen_rating_invariant(store: &MyMoviesStore) {
    for entry in store.movies().values() {
        assert_eq!(
            !entry.seen,
            entry.rating == 0,
            "seen/rating invariant broken for {}",
            entry.imdb_id
        );
    }
}

#[tokio::test]
async fn fetch_all_keys_entries_by_imdb_id() {
    let (mut store, _, messages) = store_with(seed());

    store.fetch_all_movies().await;

    assert_eq!(store.movies().len(), 4);
    assert!(store.has_entry("tt0800369"));
    assert_eq!(store.movies()["tt2015381"].rating, 10);
    assert_seen_rating_invariant(&store);
    assert!(messages.snapshot().await.is_empty());
}

#[tokio::test]
async fn fetch_all_with_empty_backend_yields_empty_map() {
    let (mut store, _, messages) = store_with(Vec::new());

    store.fetch_all_movies().await;

    assert!(store.movies().is_empty());
    assert!(messages.snapshot().await.is_empty());
}

#[tokio::test]
async fn fetch_all_failure_keeps_map_and_notifies() {
    let (mut store, backend, messages) = store_with(seed());
    store.fetch_all_movies().await;

    backend.set_unreachable(true);
    store.fetch_all_movies().await;

    assert_eq!(store.movies().len(), 4);
    let notes = messages.snapshot().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(
        notes[0].text,
        "Listing failed because of an unknown error: MyMovies server could not be reached!"
    );
}

#[tokio::test]
async fn add_movie_learns_the_backend_assigned_id() {
    let (mut store, _, _) = store_with(seed());
    store.fetch_all_movies().await;

    store
        .add_movie("tt1234567", "Test")
        .await
        .expect("add movie");

    let added = &store.movies()["tt1234567"];
    assert_eq!(added.id, 5);
    assert_eq!(added.name, "Test");
    assert!(!added.seen);
    assert_eq!(added.rating, 0);
    assert_seen_rating_invariant(&store);
}

#[tokio::test]
async fn add_movie_conflict_propagates_to_the_caller() {
    let (mut store, _, messages) = store_with(seed());
    store.fetch_all_movies().await;

    let err = store.add_movie("tt2015381", "Guardians again").await.unwrap_err();

    assert_eq!(err.to_string(), "Movie already exists");
    match err {
        StoreError::Backend(MyMoviesError::Api(_)) => {}
        other => panic!("expected a backend error, got {other:?}"),
    }
    assert_eq!(store.movies()["tt2015381"].name, "Guardians of the Galaxy");
    assert_eq!(store.movies().len(), 4);
    // addMovie errors are for the caller, not the message log.
    assert!(messages.snapshot().await.is_empty());
}

#[tokio::test]
async fn add_movie_validates_its_arguments() {
    let (mut store, _, _) = store_with(seed());

    let err = store.add_movie("", "Test").await.unwrap_err();
    assert_eq!(err.to_string(), "Argument 'imdbId' is too short!");

    let err = store.add_movie("tt1234567", "").await.unwrap_err();
    assert_eq!(err.to_string(), "Argument 'name' is too short!");
    assert!(store.movies().is_empty());
}

#[tokio::test]
async fn rerating_a_seen_movie_updates_rating_only() {
    let (mut store, backend, _) = store_with(seed());
    store.fetch_all_movies().await;

    store
        .set_movie_rating("tt0800369", 8, true)
        .await
        .expect("re-rate");

    assert_eq!(store.movies()["tt0800369"].rating, 8);
    assert!(store.movies()["tt0800369"].seen);
    assert_seen_rating_invariant(&store);
    // The backend saw the plain rating update, not the seen transition.
    let row = backend.get_movie("tt0800369").await.expect("row");
    assert_eq!(row.rating, 8);
    assert!(row.seen);
}

#[tokio::test]
async fn rating_an_unseen_movie_marks_it_seen() {
    let (mut store, _, _) = store_with(seed());
    store.fetch_all_movies().await;

    store
        .set_movie_rating("tt2948356", 7, false)
        .await
        .expect("first rating");

    let rated = &store.movies()["tt2948356"];
    assert!(rated.seen);
    assert_eq!(rated.rating, 7);
    assert_seen_rating_invariant(&store);
}

#[tokio::test]
async fn rating_must_be_between_one_and_ten() {
    let (mut store, _, _) = store_with(seed());
    store.fetch_all_movies().await;

    for bad in [0u8, 11] {
        let err = store
            .set_movie_rating("tt0800369", bad, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Argument 'rating' must be between 1 and 10!");
    }
    assert_eq!(store.movies()["tt0800369"].rating, 5);
}

#[tokio::test]
async fn failed_rating_update_keeps_local_state() {
    let (mut store, backend, messages) = store_with(seed());
    store.fetch_all_movies().await;

    backend.set_unreachable(true);
    store
        .set_movie_rating("tt0800369", 9, true)
        .await
        .expect("failure is notified, not raised");

    assert_eq!(store.movies()["tt0800369"].rating, 5);
    let notes = messages.snapshot().await;
    assert_eq!(
        notes[0].text,
        "Updating movie rating failed because of the following error: MyMovies server could not be reached!"
    );
}

#[tokio::test]
async fn unseeing_a_movie_clears_its_rating() {
    let (mut store, _, _) = store_with(seed());
    store.fetch_all_movies().await;

    store
        .set_movie_unseen("tt2015381")
        .await
        .expect("set unseen");

    let unseen = &store.movies()["tt2015381"];
    assert!(!unseen.seen);
    assert_eq!(unseen.rating, 0);
    assert_seen_rating_invariant(&store);
}

#[tokio::test]
async fn failed_unseen_update_keeps_local_state() {
    let (mut store, backend, messages) = store_with(seed());
    store.fetch_all_movies().await;

    backend.set_unreachable(true);
    store
        .set_movie_unseen("tt2015381")
        .await
        .expect("failure is notified, not raised");

    assert!(store.movies()["tt2015381"].seen);
    assert_eq!(store.movies()["tt2015381"].rating, 10);
    let notes = messages.snapshot().await;
    assert_eq!(
        notes[0].text,
        "Updating movie seen failed because of the following error: MyMovies server could not be reached!"
    );
}

#[tokio::test]
async fn delete_removes_the_entry() {
    let (mut store, _, messages) = store_with(seed());
    store.fetch_all_movies().await;

    store.delete_movie("tt0800369").await.expect("delete");

    assert!(!store.has_entry("tt0800369"));
    assert_eq!(store.movies().len(), 3);
    assert!(messages.snapshot().await.is_empty());
}

#[tokio::test]
async fn failed_delete_keeps_the_entry_and_notifies() {
    let (mut store, backend, messages) = store_with(seed());
    store.fetch_all_movies().await;

    backend.set_unreachable(true);
    store
        .delete_movie("tt0800369")
        .await
        .expect("failure is notified, not raised");

    assert!(store.has_entry("tt0800369"));
    let notes = messages.snapshot().await;
    assert_eq!(
        notes[0].text,
        "Deleting movie failed because of the following error: MyMovies server could not be reached!"
    );
}

#[tokio::test]
async fn delete_and_unseen_validate_the_imdb_id() {
    let (mut store, _, _) = store_with(seed());

    let err = store.delete_movie("").await.unwrap_err();
    assert_eq!(err.to_string(), "Argument 'imdbId' is too short!");

    let err = store.set_movie_unseen("").await.unwrap_err();
    assert_eq!(err.to_string(), "Argument 'imdbId' is too short!");
}
