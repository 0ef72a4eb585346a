use crate::error::StoreError;
use crate::messages::{Messages, Notification};
use crate::models::{MovieEntry, SearchHit};
use crate::movies::{MyMoviesStore, SharedMovies};
use crate::mymovies::{MyMoviesClient, MyMoviesError};
use crate::omdb::OmdbClient;
use crate::search::{SearchFilters, SearchSession};
use crate::sort::{sort_movies, Direction, SortKey, SortOrder};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{env, net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tracing::info;

const DEFAULT_PORT: u16 = 8090;

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<Mutex<SearchSession>>,
    pub movies: SharedMovies,
    pub messages: Messages,
}

pub async fn run_server() -> Result<()> {
    let omdb = Arc::new(OmdbClient::from_env()?);
    let backend = Arc::new(MyMoviesClient::from_env());
    let messages = Messages::new();

    let movies = SharedMovies::new(MyMoviesStore::new(backend, messages.clone()));
    movies.0.lock().await.fetch_all_movies().await;

    let search = Arc::new(Mutex::new(SearchSession::new(
        omdb,
        Arc::new(movies.clone()),
        messages.clone(),
    )));

    let state = AppState {
        search,
        movies,
        messages,
    };
    let app = build_router(state);

    let port = env::var("FILMLOG_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/search", get(run_search))
        .route("/api/search/page/:page", put(go_to_page))
        .route("/api/search/next", put(next_page))
        .route("/api/search/previous", put(previous_page))
        .route("/api/movies", get(list_movies).post(add_movie))
        .route("/api/movies/:imdb_id", delete(delete_movie))
        .route("/api/movies/:imdb_id/rating", put(rate_movie))
        .route("/api/movies/:imdb_id/unseen", put(unsee_movie))
        .route("/api/messages", get(list_messages))
        .route("/api/messages/:id", delete(dismiss_message))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::InvalidArgument { .. } | StoreError::Failed(_) => StatusCode::BAD_REQUEST,
            StoreError::SetupCallMissing { .. } => StatusCode::CONFLICT,
            StoreError::Backend(MyMoviesError::Api(msg)) if msg.contains("already exists") => {
                StatusCode::CONFLICT
            }
            StoreError::Backend(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    name: String,
    #[serde(rename = "type")]
    search_type: Option<String>,
    year: Option<String>,
}

impl SearchParams {
    fn filters(&self) -> SearchFilters {
        SearchFilters {
            search_type: self.search_type.clone(),
            year: self.year.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchView {
    results: Vec<SearchHit>,
    total_results: u32,
    page: u32,
    last_page: u32,
}

fn search_view(session: &SearchSession) -> SearchView {
    SearchView {
        results: session.results().to_vec(),
        total_results: session.total_results(),
        page: session.page(),
        last_page: session.last_page(),
    }
}

async fn run_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchView>, ApiError> {
    let mut session = state.search.lock().await;
    session.search(&params.name, &params.filters()).await?;
    Ok(Json(search_view(&session)))
}

async fn go_to_page(
    State(state): State<AppState>,
    Path(page): Path<u32>,
) -> Result<Json<SearchView>, ApiError> {
    let mut session = state.search.lock().await;
    session.go_to_page(page).await?;
    Ok(Json(search_view(&session)))
}

async fn next_page(State(state): State<AppState>) -> Result<Json<SearchView>, ApiError> {
    let mut session = state.search.lock().await;
    session.next_page().await?;
    Ok(Json(search_view(&session)))
}

async fn previous_page(State(state): State<AppState>) -> Result<Json<SearchView>, ApiError> {
    let mut session = state.search.lock().await;
    session.previous_page().await?;
    Ok(Json(search_view(&session)))
}

#[derive(Debug, Deserialize)]
struct SortParams {
    sort: Option<SortKey>,
    direction: Option<Direction>,
}

async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<SortParams>,
) -> Json<Vec<MovieEntry>> {
    let order = match params.sort {
        Some(key) => SortOrder {
            key,
            direction: params.direction.unwrap_or(Direction::Ascending),
        },
        None => SortOrder::default(),
    };
    let store = state.movies.0.lock().await;
    Json(sort_movies(store.movies(), order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMovieBody {
    imdb_id: String,
    name: String,
}

async fn add_movie(
    State(state): State<AppState>,
    Json(body): Json<AddMovieBody>,
) -> Result<(StatusCode, Json<MovieEntry>), ApiError> {
    let entry = {
        let mut store = state.movies.0.lock().await;
        store.add_movie(&body.imdb_id, &body.name).await?;
        store
            .movies()
            .get(&body.imdb_id)
            .cloned()
            .ok_or_else(|| StoreError::Failed("added movie missing from store".to_string()))?
    };
    state.search.lock().await.refresh_annotations().await;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_movie(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.movies.0.lock().await.delete_movie(&imdb_id).await?;
    state.search.lock().await.refresh_annotations().await;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RatingBody {
    rating: u8,
    /// Whether the movie was already seen before this rating.
    #[serde(default = "default_seen")]
    seen: bool,
}

fn default_seen() -> bool {
    true
}

async fn rate_movie(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
    Json(body): Json<RatingBody>,
) -> Result<StatusCode, ApiError> {
    state
        .movies
        .0
        .lock()
        .await
        .set_movie_rating(&imdb_id, body.rating, body.seen)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unsee_movie(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .movies
        .0
        .lock()
        .await
        .set_movie_unseen(&imdb_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_messages(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.messages.snapshot().await)
}

async fn dismiss_message(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.messages.dismiss(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
