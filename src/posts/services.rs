use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::models::{CreatePostRequest, Post, PostListRow, PostSummary, UpdatePostRequest};
use crate::auth::AuthedUser;
use crate::common::slug::with_suffix;
use crate::common::{generate_post_id, is_unique_violation, slugify, ApiError, Validator};

/// Suffixed slugs tried after the first insert collides
const MAX_SLUG_ATTEMPTS: usize = 5;

pub struct PostsService {
    db: SqlitePool,
}

impl PostsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Reads
    // ============================================================================

    /// All posts, newest first, with category and author resolved
    pub async fn list_posts(&self) -> Result<Vec<PostSummary>, ApiError> {
        let rows = sqlx::query_as::<_, PostListRow>(
            r#"
            SELECT p.id, p.title, p.slug, p.content, p.image_path, p.created_at, p.updated_at,
                   c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
                   u.id AS author_id, u.name AS author_name, u.email AS author_email
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            LEFT JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC, p.rowid DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PostSummary::from).collect())
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ApiError> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Not found".to_string()))
    }

    pub async fn get_post_by_id(&self, post_id: &str) -> Result<Post, ApiError> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Not found".to_string()))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, ApiError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn ensure_category_exists(&self, category_id: &str) -> Result<(), ApiError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM categories WHERE id = ?")
            .bind(category_id)
            .fetch_optional(&self.db)
            .await?;
        match row {
            Some(_) => Ok(()),
            None => Err(ApiError::ValidationError(
                "category_id: unknown category".to_string(),
            )),
        }
    }

    // ============================================================================
    // Writes
    // ============================================================================

    /// Create a post owned by `author`.
    ///
    /// A colliding slug gets a random suffix instead of failing; the UNIQUE
    /// constraint on `posts.slug` is the final arbiter.
    pub async fn create_post(
        &self,
        request: CreatePostRequest,
        author: &AuthedUser,
    ) -> Result<Post, ApiError> {
        let validation_result = request.validate();
        if !validation_result.is_valid {
            return Err(ApiError::from(validation_result));
        }

        let title = request.title.trim().to_string();
        let content = request.content.trim().to_string();
        let category_id = request.category_id.filter(|c| !c.trim().is_empty());
        if let Some(category_id) = &category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let base_slug = request
            .slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&title));

        let mut slug = if self.slug_exists(&base_slug).await? {
            with_suffix(&base_slug)
        } else {
            base_slug.clone()
        };

        for attempt in 0..=MAX_SLUG_ATTEMPTS {
            let now = Utc::now().to_rfc3339();
            let result = sqlx::query_as::<_, Post>(
                r#"
                INSERT INTO posts (id, title, slug, content, image_path, category_id, author_id,
                                   created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(generate_post_id())
            .bind(&title)
            .bind(&slug)
            .bind(&content)
            .bind(request.image_path.as_deref())
            .bind(category_id.as_deref())
            .bind(author.id())
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.db)
            .await;

            match result {
                Ok(post) => {
                    info!(
                        post_id = %post.id,
                        slug = %post.slug,
                        author_id = %author.id(),
                        "Post created"
                    );
                    return Ok(post);
                }
                Err(e) if is_unique_violation(&e) => {
                    debug!(attempt, slug = %slug, "Slug taken at insert, retrying");
                    slug = with_suffix(&base_slug);
                }
                Err(e) => return Err(ApiError::DatabaseError(e)),
            }
        }

        warn!(base_slug = %base_slug, "Could not allocate a unique slug");
        Err(ApiError::Conflict("could not allocate a unique slug".to_string()))
    }

    /// Apply a partial update. Only the author or an admin may edit.
    ///
    /// Checks run in order: the post exists, the caller may edit it, then
    /// the field rules. Only columns present in the request are written.
    pub async fn update_post(
        &self,
        post_id: &str,
        request: UpdatePostRequest,
        editor: &AuthedUser,
    ) -> Result<Post, ApiError> {
        let current = self.get_post_by_id(post_id).await?;

        if !editor.is_admin() && editor.id() != current.author_id {
            warn!(
                post_id = %post_id,
                user_id = %editor.id(),
                author_id = %current.author_id,
                "Update denied: caller is neither author nor admin"
            );
            return Err(ApiError::Forbidden("Forbidden".to_string()));
        }

        let validation_result = request.validate();
        if !validation_result.is_valid {
            return Err(ApiError::from(validation_result));
        }

        let title = request.title.map(|t| t.trim().to_string());
        let content = request.content.map(|c| c.trim().to_string());
        let slug = request
            .slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let category_id = request
            .category_id
            .map(|c| c.filter(|id| !id.trim().is_empty()));
        if let Some(Some(id)) = &category_id {
            self.ensure_category_exists(id).await?;
        }
        let (set_image, image_path) = match request.image_path {
            Some(value) => (true, value),
            None => (false, None),
        };
        let (set_category, category_id) = match category_id {
            Some(value) => (true, value),
            None => (false, None),
        };

        // author_id and created_at are never written here
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = COALESCE(?, title),
                content = COALESCE(?, content),
                slug = COALESCE(?, slug),
                image_path = CASE WHEN ? THEN ? ELSE image_path END,
                category_id = CASE WHEN ? THEN ? ELSE category_id END,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(slug)
        .bind(set_image)
        .bind(image_path)
        .bind(set_category)
        .bind(category_id)
        .bind(Utc::now().to_rfc3339())
        .bind(post_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("slug already in use".to_string())
            } else {
                ApiError::DatabaseError(e)
            }
        })?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

        info!(post_id = %post_id, user_id = %editor.id(), "Post updated");
        Ok(post)
    }

    /// Hard delete; role checks happen in the route guard
    pub async fn delete_post(&self, post_id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Not found".to_string()));
        }

        info!(post_id = %post_id, "Post deleted");
        Ok(())
    }
}
