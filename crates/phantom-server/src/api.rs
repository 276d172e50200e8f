use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use phantom_shared::{ObjectId, TokenService};
use phantom_store::{Changes, ContentItem, Movie, MovieFields, MovieSummary, NewItem, NewUser};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::Authenticated;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::ownership;
use crate::password;
use crate::planner::{self, GenreSort};
use crate::store::ContentStore;
use crate::validate;

#[derive(Clone)]
pub struct AppState {
    pub store: ContentStore,
    pub tokens: Arc<TokenService>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let routes = Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/search", get(search_movies))
        .route("/movies", post(create_movie))
        .route("/movies/genres", get(list_movies_by_genre))
        .route("/movies/most_watched", get(list_most_watched))
        .route("/movies/latest", get(list_latest))
        .route("/movies/:id", get(get_movie).put(update_movie))
        .route(
            "/comments",
            get(list_comments)
                .post(create_comment)
                .put(update_comment)
                .delete(delete_comment),
        );

    with_deadline(routes, state.config.request_timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cap each request at `limit`. The store call keeps running on the blocking
/// pool after the deadline, so a write may still commit once 408 is sent.
fn with_deadline<S>(router: Router<S>, limit: std::time::Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(TimeoutLayer::new(limit))
        .layer(middleware::map_response(timeout_as_json))
}

/// `TimeoutLayer` answers with an empty 408; give it the usual error body.
async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ServerError::Timeout.into_response();
    }
    response
}

// ─── Request / response shapes ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct IdResponse {
    id: ObjectId,
}

#[derive(Deserialize)]
struct PageParams {
    s: Option<i64>,
    p: Option<i64>,
}

#[derive(Deserialize)]
struct SearchParams {
    search: Option<String>,
    s: Option<i64>,
    p: Option<i64>,
}

#[derive(Deserialize)]
struct GenreParams {
    genres: Option<String>,
    sort: Option<String>,
    s: Option<i64>,
    p: Option<i64>,
}

#[derive(Deserialize)]
struct CommentListParams {
    movie_id: Option<String>,
    s: Option<i64>,
    p: Option<i64>,
}

#[derive(Serialize)]
struct CommentResponse {
    id: ObjectId,
    name: String,
    text: String,
}

/// Comment creation payload. There is no owner field: the owner is the
/// caller, and any `name` a client sends is ignored.
#[derive(Deserialize)]
struct CreateCommentRequest {
    movie_id: String,
    #[serde(default)]
    email: String,
    text: String,
}

#[derive(Deserialize)]
struct UpdateCommentRequest {
    id: String,
    text: String,
}

#[derive(Deserialize)]
struct CommentIdRequest {
    id: String,
}

#[derive(Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    user_id: ObjectId,
    access_token: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    password: String,
}

#[derive(Serialize)]
struct UserResponse {
    id: ObjectId,
    username: String,
    email: String,
}

#[derive(Serialize)]
struct LoginResponse {
    access_token: String,
    user: UserResponse,
}

// ─── Public reads ───

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_movie(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Movie>, ServerError> {
    let Path(raw) = path?;
    let id = validate::object_id(&raw, "id")?;
    Ok(Json(state.store.get_movie(id).await?))
}

async fn search_movies(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<MovieSummary>>, ServerError> {
    let Query(params) = query?;
    let text = validate::required(params.search.as_deref(), "search")?;
    let page = validate::movie_page(params.s, params.p)?;

    movie_listing(&state, planner::search(text, page)).await
}

async fn list_movies_by_genre(
    State(state): State<AppState>,
    query: Result<Query<GenreParams>, QueryRejection>,
) -> Result<Json<Vec<MovieSummary>>, ServerError> {
    let Query(params) = query?;
    let genre = validate::required(params.genres.as_deref(), "genres")?;
    let page = validate::movie_page(params.s, params.p)?;
    let sort = GenreSort::parse(params.sort.as_deref());

    movie_listing(&state, planner::genre_window(genre, sort, page, Utc::now())).await
}

async fn list_most_watched(
    State(state): State<AppState>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Vec<MovieSummary>>, ServerError> {
    let Query(params) = query?;
    let page = validate::movie_page(params.s, params.p)?;
    movie_listing(&state, planner::most_watched(page)).await
}

async fn list_latest(
    State(state): State<AppState>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Vec<MovieSummary>>, ServerError> {
    let Query(params) = query?;
    let page = validate::movie_page(params.s, params.p)?;
    movie_listing(&state, planner::latest(page)).await
}

async fn movie_listing(
    state: &AppState,
    spec: phantom_store::QuerySpec,
) -> Result<Json<Vec<MovieSummary>>, ServerError> {
    let items = state.store.execute(spec).await?;
    Ok(Json(
        items.into_iter().filter_map(ContentItem::into_movie).collect(),
    ))
}

async fn list_comments(
    State(state): State<AppState>,
    query: Result<Query<CommentListParams>, QueryRejection>,
) -> Result<Json<Vec<CommentResponse>>, ServerError> {
    let Query(params) = query?;
    let raw_id = validate::required(params.movie_id.as_deref(), "movie_id")?;
    let movie_id = validate::object_id(raw_id, "movie_id")?;
    let page = validate::comment_page(params.s, params.p)?;

    let items = state
        .store
        .execute(planner::movie_comments(movie_id, page))
        .await?;
    Ok(Json(
        items
            .into_iter()
            .filter_map(ContentItem::into_comment)
            .map(|c| CommentResponse {
                id: c.id,
                name: c.name,
                text: c.text,
            })
            .collect(),
    ))
}

// ─── Accounts ───

async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ServerError> {
    let Json(req) = body?;
    validate::username(&req.name)?;
    validate::email(&req.email)?;
    validate::password(&req.password)?;

    let hash = password::hash_password(&req.password)?;
    let user_id = state
        .store
        .add_user(NewUser {
            name: req.name.clone(),
            email: req.email,
            password_hash: hash,
        })
        .await?;

    let access_token = issue_token(&state, &req.name)?;
    info!(user = %req.name, %user_id, "Registered user");

    Ok(Json(RegisterResponse {
        user_id,
        access_token,
    }))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServerError> {
    let Json(req) = body?;
    validate::password(&req.password)?;

    let username = req.username.filter(|u| !u.is_empty());
    let email = req.email.filter(|e| !e.is_empty());

    let user = match (email, username) {
        (Some(email), _) => {
            validate::email(&email)?;
            state.store.get_user_by_email(email).await?
        }
        (None, Some(name)) => {
            validate::username(&name)?;
            state.store.get_user_by_name(name).await?
        }
        (None, None) => {
            return Err(ServerError::BadRequest(
                "one of `username` or `email` is required".into(),
            ))
        }
    };

    if !password::verify_password(&req.password, &user.password)? {
        tracing::debug!(user = %user.name, "password mismatch");
        return Err(ServerError::Unauthorized);
    }

    let access_token = issue_token(&state, &user.name)?;
    Ok(Json(LoginResponse {
        access_token,
        user: UserResponse {
            id: user.id,
            username: user.name,
            email: user.email,
        },
    }))
}

fn issue_token(state: &AppState, username: &str) -> Result<String, ServerError> {
    state
        .tokens
        .issue(username, state.config.access_token_duration)
        .map_err(|e| ServerError::Internal(format!("issuing token: {e}")))
}

// ─── Protected writes ───

async fn create_movie(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    body: Result<Json<MovieFields>, JsonRejection>,
) -> Result<Json<IdResponse>, ServerError> {
    let Json(fields) = body?;
    validate::required(Some(fields.title.as_str()), "title")?;

    let id = state.store.insert(NewItem::Movie(fields)).await?;
    info!(user = %principal.username, %id, "Movie created");
    Ok(Json(IdResponse { id }))
}

async fn update_movie(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<MovieFields>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let Path(raw) = path?;
    let id = validate::object_id(&raw, "id")?;
    let Json(fields) = body?;
    validate::required(Some(fields.title.as_str()), "title")?;

    let matched = state
        .store
        .mutate(ownership::movie_match(id), Changes::ReplaceMovie(fields))
        .await?;
    ownership::expect_affected(matched, "Movie")?;

    info!(user = %principal.username, %id, "Movie replaced");
    Ok(Json(serde_json::json!({ "updated": "OK" })))
}

async fn create_comment(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<Json<IdResponse>, ServerError> {
    let Json(req) = body?;
    let movie_id = validate::object_id(&req.movie_id, "movie_id")?;
    validate::required(Some(req.text.as_str()), "text")?;
    if !req.email.is_empty() {
        validate::email(&req.email)?;
    }

    let item = ownership::new_comment(&principal, movie_id, req.email, req.text, Utc::now());
    let id = state.store.insert(item).await?;
    info!(user = %principal.username, %id, %movie_id, "Comment created");
    Ok(Json(IdResponse { id }))
}

async fn update_comment(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    body: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let Json(req) = body?;
    let id = validate::object_id(&req.id, "id")?;
    validate::required(Some(req.text.as_str()), "text")?;

    let matched = state
        .store
        .mutate(
            ownership::comment_match(&principal, id),
            Changes::CommentText(req.text),
        )
        .await?;
    ownership::expect_affected(matched, "Comment")?;

    Ok(Json(serde_json::json!({ "updated": "ok" })))
}

async fn delete_comment(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    body: Result<Json<CommentIdRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let Json(req) = body?;
    let id = validate::object_id(&req.id, "id")?;

    let deleted = state
        .store
        .delete_matching(ownership::comment_match(&principal, id))
        .await?;
    ownership::expect_affected(deleted, "Comment")?;

    info!(user = %principal.username, %id, "Comment deleted");
    Ok(Json(serde_json::json!({ "deleted": "OK" })))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
