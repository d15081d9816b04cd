use crate::entities::{Post, PostFields};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, slug, title, content, description, keywords, hero_image, \
     reading_time_minutes, content_checksum, created_at, updated_at";

/// Result of an in-place update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    Updated(Post),
    /// Stored checksum already matched; nothing was written.
    Unchanged(Post),
}

/// Durable storage for blog posts, keyed by slug.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Cheap connectivity check.
    async fn ping(&self) -> Result<()>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Insert a new post. Returns `None` when the slug is already taken.
    async fn create(&self, fields: &PostFields) -> Result<Option<Post>>;

    async fn update(&self, id: Uuid, fields: &PostFields) -> Result<UpdateResult>;
}

/// PostgreSQL-backed post storage.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: Pool<Postgres>,
}

impl PgPostRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn create(&self, fields: &PostFields) -> Result<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO blog_posts
                  (id, slug, title, content, description, keywords, hero_image,
                   reading_time_minutes, content_checksum)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (slug) DO NOTHING
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&fields.slug)
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(&fields.description)
        .bind(&fields.keywords)
        .bind(&fields.hero_image)
        .bind(fields.reading_time_minutes)
        .bind(fields.checksum())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(post)
    }

    async fn update(&self, id: Uuid, fields: &PostFields) -> Result<UpdateResult> {
        let mut tx = self.pool.begin().await?;
        let checksum = fields.checksum();

        let existing = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        // Early return if content hasn't changed (checksum match)
        if existing.content_checksum == checksum {
            debug!(slug = %existing.slug, "checksum unchanged, skipping write");
            tx.commit().await?;
            return Ok(UpdateResult::Unchanged(existing));
        }

        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE blog_posts
               SET title                = $2,
                   content              = $3,
                   description          = $4,
                   keywords             = $5,
                   hero_image           = $6,
                   reading_time_minutes = $7,
                   content_checksum     = $8,
                   updated_at           = now()
             WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(&fields.description)
        .bind(&fields.keywords)
        .bind(&fields.hero_image)
        .bind(fields.reading_time_minutes)
        .bind(checksum)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(UpdateResult::Updated(post))
    }
}
