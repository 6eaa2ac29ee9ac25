use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::models::{Category, CreateCategoryRequest};
use crate::common::{generate_category_id, is_unique_violation, slugify, ApiError, Validator};

pub struct CategoriesService {
    db: SqlitePool,
}

impl CategoriesService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All categories, newest first
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, created_at FROM categories
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(categories)
    }

    /// Create a category; a duplicate name or slug is a conflict, not a suffix retry
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<Category, ApiError> {
        let validation_result = request.validate();
        if !validation_result.is_valid {
            return Err(ApiError::from(validation_result));
        }

        let name = request.name.trim().to_string();
        let slug = request
            .slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name, slug, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, slug, created_at
            "#,
        )
        .bind(generate_category_id())
        .bind(&name)
        .bind(&slug)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Category exists".to_string())
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

        info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }
}
