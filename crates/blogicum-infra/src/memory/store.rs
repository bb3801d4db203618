//! In-memory blog store - used when no database is configured, and in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, CommentEntry, Location, Post, PostEntry, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::Slice;
use blogicum_core::policy;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostFilter,
    PostRepository, Repositories, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    locations: Vec<Location>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

/// Insert or replace a row, keeping insertion order for new rows.
fn upsert<T>(rows: &mut Vec<T>, row: T, id: impl Fn(&T) -> Uuid) {
    let key = id(&row);
    match rows.iter_mut().find(|existing| id(&**existing) == key) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
}

fn remove<T>(rows: &mut Vec<T>, key: Uuid, id: impl Fn(&T) -> Uuid) -> Result<(), RepoError> {
    let before = rows.len();
    rows.retain(|row| id(row) != key);
    if rows.len() == before {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

impl Tables {
    fn username(&self, user_id: Uuid) -> String {
        self.users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.username.clone())
            .unwrap_or_default()
    }

    fn entry(&self, post: &Post) -> PostEntry {
        PostEntry {
            post: post.clone(),
            author_username: self.username(post.author_id),
            category: post
                .category_id
                .and_then(|id| self.categories.iter().find(|c| c.id == id).cloned()),
            location: post
                .location_id
                .and_then(|id| self.locations.iter().find(|l| l.id == id).cloned()),
            comment_count: self
                .comments
                .iter()
                .filter(|comment| comment.post_id == post.id)
                .count() as u64,
        }
    }

    fn matching(&self, filter: &PostFilter) -> Vec<PostEntry> {
        let entries = self
            .posts
            .iter()
            .filter(|post| filter.category_id.is_none_or(|id| post.category_id == Some(id)))
            .filter(|post| filter.author_id.is_none_or(|author| post.author_id == author))
            .map(|post| self.entry(post));

        let mut entries = match filter.visible_at {
            Some(now) => policy::filter_visible_posts(entries, now),
            None => entries.collect(),
        };
        entries.sort_by(PostEntry::listing_cmp);
        entries
    }
}

/// All blog tables behind one async lock.
///
/// Mirrors the relational cascades: deleting a user removes their posts and
/// comments, deleting a post removes its comments, and deleting a category or
/// location detaches it from its posts.
#[derive(Default)]
pub struct InMemoryBlogStore {
    tables: RwLock<Tables>,
}

impl InMemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose this store through every repository port.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            categories: self.clone(),
            locations: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
        }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.id == id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|other| other.username == user.username && other.id != user.id)
        {
            return Err(RepoError::Constraint("username already exists".to_string()));
        }
        upsert(&mut tables.users, user.clone(), |u| u.id);
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.users, id, |u| u.id)?;

        let authored: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|post| post.author_id == id)
            .map(|post| post.id)
            .collect();
        tables.posts.retain(|post| post.author_id != id);
        tables
            .comments
            .retain(|comment| comment.author_id != id && !authored.contains(&comment.post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryBlogStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn save(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .iter()
            .any(|other| other.slug == category.slug && other.id != category.id)
        {
            return Err(RepoError::Constraint("slug already exists".to_string()));
        }
        upsert(&mut tables.categories, category.clone(), |c| c.id);
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.categories, id, |c| c.id)?;
        for post in tables.posts.iter_mut().filter(|p| p.category_id == Some(id)) {
            post.category_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryBlogStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.slug == slug).cloned())
    }
}

#[async_trait]
impl BaseRepository<Location, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.locations.iter().find(|l| l.id == id).cloned())
    }

    async fn save(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.tables.write().await;
        upsert(&mut tables.locations, location.clone(), |l| l.id);
        Ok(location)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.locations, id, |l| l.id)?;
        for post in tables.posts.iter_mut().filter(|p| p.location_id == Some(id)) {
            post.location_id = None;
        }
        Ok(())
    }
}

impl LocationRepository for InMemoryBlogStore {}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|user| user.id == post.author_id) {
            return Err(RepoError::Constraint("post author does not exist".to_string()));
        }
        upsert(&mut tables.posts, post.clone(), |p| p.id);
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.posts, id, |p| p.id)?;
        tables.comments.retain(|comment| comment.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryBlogStore {
    async fn find_entry(&self, id: Uuid) -> Result<Option<PostEntry>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|post| tables.entry(post)))
    }

    async fn count_entries(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.matching(filter).len() as u64)
    }

    async fn list_entries(
        &self,
        filter: &PostFilter,
        slice: Slice,
    ) -> Result<Vec<PostEntry>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matching(filter)
            .into_iter()
            .skip(slice.offset as usize)
            .take(slice.limit as usize)
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|post| post.id == comment.post_id) {
            return Err(RepoError::Constraint("comment post does not exist".to_string()));
        }
        upsert(&mut tables.comments, comment.clone(), |c| c.id);
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.comments, id, |c| c.id)
    }
}

#[async_trait]
impl CommentRepository for InMemoryBlogStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<CommentEntry> = tables
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .map(|comment| CommentEntry {
                comment: comment.clone(),
                author_username: tables.username(comment.author_id),
            })
            .collect();
        comments.sort_by_key(|entry| entry.comment.created_at);
        Ok(comments)
    }
}
