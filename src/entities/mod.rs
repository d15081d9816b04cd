use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// --- Tables ---

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    /// Sanitized HTML.
    pub content: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub hero_image: Option<String>,
    pub reading_time_minutes: i32,
    pub content_checksum: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable columns of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFields {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub hero_image: Option<String>,
    pub reading_time_minutes: i32,
}

impl PostFields {
    /// MD5 over the fields a reader sees; equal checksums mean an update would be a no-op.
    pub fn checksum(&self) -> String {
        let mut hasher = md5::Context::new();
        hasher.consume(self.title.as_bytes());
        hasher.consume([0u8]);
        hasher.consume(self.content.as_bytes());
        hasher.consume([0u8]);
        hasher.consume(self.description.as_deref().unwrap_or_default().as_bytes());
        format!("{:x}", hasher.compute())
    }
}
