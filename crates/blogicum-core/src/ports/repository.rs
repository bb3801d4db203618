use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentEntry, Location, Post, PostEntry, User};
use crate::error::RepoError;
use crate::pagination::Slice;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    /// Find a category by slug, regardless of its published flag.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;
}

pub trait LocationRepository: BaseRepository<Location, Uuid> {}

/// Criteria for post listings. Unset fields do not constrain the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Keep only posts publicly visible at this instant.
    pub visible_at: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

impl PostFilter {
    pub fn visible_at(now: DateTime<Utc>) -> Self {
        Self {
            visible_at: Some(now),
            ..Self::default()
        }
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

/// Post repository.
///
/// Listings are ordered newest `pub_date` first, then by creation time and id.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Load a post together with its author, category, location and comment count.
    async fn find_entry(&self, id: Uuid) -> Result<Option<PostEntry>, RepoError>;

    async fn count_entries(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    async fn list_entries(
        &self,
        filter: &PostFilter,
        slice: Slice,
    ) -> Result<Vec<PostEntry>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError>;
}

/// The full set of persistence ports used by the blog services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}
