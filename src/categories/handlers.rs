use axum::{extract::Extension, Json};
use std::sync::Arc;

use super::models::{CategoryResponse, CreateCategoryRequest};
use super::services::CategoriesService;
use crate::common::{ApiError, AppJson, AppState};

/// GET /api/categories
pub async fn list_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = CategoriesService::new(state.db.clone())
        .list_categories()
        .await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

/// POST /api/categories - admin or editor
pub async fn create_category(
    Extension(state): Extension<Arc<AppState>>,
    AppJson(request): AppJson<CreateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = CategoriesService::new(state.db.clone())
        .create_category(request)
        .await?;
    Ok(Json(category.into()))
}
