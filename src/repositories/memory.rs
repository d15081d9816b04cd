use crate::entities::{Post, PostFields};
use crate::repositories::post::{PostStore, UpdateResult};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

/// Post storage held in process memory, keyed by slug.
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    posts: DashMap<String, Post>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        Ok(self.posts.get(slug).map(|entry| entry.value().clone()))
    }

    async fn create(&self, fields: &PostFields) -> Result<Option<Post>> {
        match self.posts.entry(fields.slug.clone()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let post = Post {
                    id: Uuid::new_v4(),
                    slug: fields.slug.clone(),
                    title: fields.title.clone(),
                    content: fields.content.clone(),
                    description: fields.description.clone(),
                    keywords: fields.keywords.clone(),
                    hero_image: fields.hero_image.clone(),
                    reading_time_minutes: fields.reading_time_minutes,
                    content_checksum: fields.checksum(),
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(post.clone());
                Ok(Some(post))
            }
        }
    }

    async fn update(&self, id: Uuid, fields: &PostFields) -> Result<UpdateResult> {
        let mut entry = self
            .posts
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| anyhow!("post {id} not found"))?;
        let post = entry.value_mut();

        let checksum = fields.checksum();
        if post.content_checksum == checksum {
            return Ok(UpdateResult::Unchanged(post.clone()));
        }

        post.title = fields.title.clone();
        post.content = fields.content.clone();
        post.description = fields.description.clone();
        post.keywords = fields.keywords.clone();
        post.hero_image = fields.hero_image.clone();
        post.reading_time_minutes = fields.reading_time_minutes;
        post.content_checksum = checksum;
        post.updated_at = Utc::now();
        Ok(UpdateResult::Updated(post.clone()))
    }
}
