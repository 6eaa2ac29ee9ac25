use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;

use super::models::{
    CreatePostRequest, CreatePostResponse, OkResponse, Post, PostSummary, UpdatePostRequest,
};
use super::services::PostsService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppJson, AppState};

// ============================================================================
// Public reads
// ============================================================================

/// GET /api/posts - All posts, newest first
pub async fn list_posts(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<PostSummary>>, ApiError> {
    let posts = PostsService::new(state.db.clone()).list_posts().await?;
    Ok(Json(posts))
}

/// GET /api/posts/:slug
pub async fn get_post(
    Extension(state): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post = PostsService::new(state.db.clone())
        .get_post_by_slug(&slug)
        .await?;
    Ok(Json(post))
}

/// GET /api/post_by_id/:id
pub async fn get_post_by_id(
    Extension(state): Extension<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post = PostsService::new(state.db.clone())
        .get_post_by_id(&post_id)
        .await?;
    Ok(Json(post))
}

// ============================================================================
// Guarded writes
// ============================================================================

/// POST /api/posts - admin or editor
pub async fn create_post(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthedUser,
    AppJson(request): AppJson<CreatePostRequest>,
) -> Result<Json<CreatePostResponse>, ApiError> {
    let post = PostsService::new(state.db.clone())
        .create_post(request, &user)
        .await?;

    Ok(Json(CreatePostResponse {
        id: post.id,
        slug: post.slug,
    }))
}

/// PUT /api/posts/:id - the post's author or an admin
pub async fn update_post(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthedUser,
    Path(post_id): Path<String>,
    AppJson(request): AppJson<UpdatePostRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    PostsService::new(state.db.clone())
        .update_post(&post_id, request, &user)
        .await?;
    Ok(Json(OkResponse { ok: true }))
}

/// DELETE /api/posts/:id - admin only
pub async fn delete_post(
    Extension(state): Extension<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    PostsService::new(state.db.clone())
        .delete_post(&post_id)
        .await?;
    Ok(Json(OkResponse { ok: true }))
}
