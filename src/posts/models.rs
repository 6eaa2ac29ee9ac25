use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image_path: Option<String>,
    pub category_id: Option<String>,
    pub author_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Row shape of the joined listing query
#[derive(Debug, FromRow)]
pub struct PostListRow {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorRef {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

/// Post as returned by `GET /api/posts`
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image_path: Option<String>,
    pub category: Option<CategoryRef>,
    pub author: Option<AuthorRef>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PostListRow> for PostSummary {
    fn from(row: PostListRow) -> Self {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef { id, name, slug }),
            _ => None,
        };
        let author = match (row.author_id, row.author_email) {
            (Some(id), Some(email)) => Some(AuthorRef {
                id,
                name: row.author_name,
                email,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            image_path: row.image_path,
            category,
            author,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub slug: Option<String>,
    pub image_path: Option<String>,
    pub category_id: Option<String>,
}

/// Partial update; only fields present in the body are applied
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub id: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
