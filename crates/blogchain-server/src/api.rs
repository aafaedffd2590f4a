use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use blogchain_shared::protocol::{Msg, MsgResponse};
use blogchain_shared::types::{Comment, CommentThread, Page, PageRequest, Post, Profile};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::{App, ChainStats};
use crate::error::ServerError;

pub type AppState = Arc<App>;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/tx", post(submit_tx))
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
        .route("/posts/:id/comments", get(list_comments))
        .route("/comments/:id", get(get_comment))
        .route("/comments/:id/thread", get(get_thread))
        .route("/profiles", get(list_profiles))
        .route("/profiles/:address", get(get_profile))
        .route("/profiles/:address/followers", get(list_followers))
        .route("/profiles/:address/following", get(list_following))
        .route("/usernames/:username", get(get_profile_by_username))
        .route("/follows/:follower/:following", get(check_follow))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(flatten)]
    stats: ChainStats,
}

#[derive(Deserialize)]
struct CommentsQuery {
    #[serde(default)]
    parent_id: u64,
}

#[derive(Deserialize)]
struct ThreadQuery {
    max_depth: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FollowStatus {
    is_following: bool,
}

async fn health_check(State(app): State<AppState>) -> Result<Json<HealthResponse>, ServerError> {
    let stats = run(app, |app| app.stats()).await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        stats,
    }))
}

async fn submit_tx(
    State(app): State<AppState>,
    Json(msg): Json<Msg>,
) -> Result<Json<MsgResponse>, ServerError> {
    Ok(Json(run(app, move |app| app.deliver(msg)).await?))
}

async fn list_posts(
    State(app): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Post>>, ServerError> {
    Ok(Json(run(app, move |app| app.posts(&page)).await?))
}

async fn get_post(
    State(app): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Post>, ServerError> {
    Ok(Json(run(app, move |app| app.post(id)).await?))
}

async fn list_comments(
    State(app): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<Comment>>, ServerError> {
    Ok(Json(run(app, move |app| app.comments(id, query.parent_id)).await?))
}

async fn get_comment(
    State(app): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Comment>, ServerError> {
    Ok(Json(run(app, move |app| app.comment(id)).await?))
}

async fn get_thread(
    State(app): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<ThreadQuery>,
) -> Result<Json<CommentThread>, ServerError> {
    Ok(Json(
        run(app, move |app| app.comment_thread(id, query.max_depth)).await?,
    ))
}

async fn list_profiles(
    State(app): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Profile>>, ServerError> {
    Ok(Json(run(app, move |app| app.profiles(&page)).await?))
}

async fn get_profile(
    State(app): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Profile>, ServerError> {
    Ok(Json(run(app, move |app| app.profile(&address)).await?))
}

async fn list_followers(
    State(app): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Vec<String>>, ServerError> {
    Ok(Json(run(app, move |app| app.followers(&address)).await?))
}

async fn list_following(
    State(app): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Vec<String>>, ServerError> {
    Ok(Json(run(app, move |app| app.following(&address)).await?))
}

async fn get_profile_by_username(
    State(app): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Profile>, ServerError> {
    Ok(Json(
        run(app, move |app| app.profile_by_username(&username)).await?,
    ))
}

async fn check_follow(
    State(app): State<AppState>,
    Path((follower, following)): Path<(String, String)>,
) -> Result<Json<FollowStatus>, ServerError> {
    let is_following = run(app, move |app| app.is_following(&follower, &following)).await?;
    Ok(Json(FollowStatus { is_following }))
}

/// Store calls lock the database and hit SQLite; they run on the blocking pool.
async fn run<T, F>(app: AppState, f: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce(&App) -> Result<T, ServerError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&app))
        .await
        .map_err(|e| ServerError::Internal(format!("Blocking task failed: {e}")))?
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
