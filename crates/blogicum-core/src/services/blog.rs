use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentEntry, Post, PostEntry, User};
use crate::error::DomainError;
use crate::input::{CommentInput, PostInput, ProfileInput, ValidPost, ValidationError};
use crate::pagination::{PAGE_SIZE, Page, PageRequest, Slice};
use crate::policy::{self, Requester};
use crate::ports::{Clock, PostFilter, Repositories};

/// A published category and one page of its visible posts.
#[derive(Debug, Clone)]
pub struct CategoryListing {
    pub category: Category,
    pub posts: Page<PostEntry>,
}

#[derive(Debug, Clone)]
pub struct ProfileListing {
    pub user: User,
    pub posts: Page<PostEntry>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: PostEntry,
    pub comments: Vec<CommentEntry>,
}

/// Posts, comments and profiles.
///
/// Mutating operations take the id of an already authenticated user; the
/// caller is responsible for turning an anonymous requester away first.
pub struct BlogService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl BlogService {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn page(
        &self,
        filter: PostFilter,
        request: PageRequest,
    ) -> Result<Page<PostEntry>, DomainError> {
        let total = self.repos.posts.count_entries(&filter).await?;
        let number = request.resolve(total, PAGE_SIZE)?;
        let items = self
            .repos
            .posts
            .list_entries(&filter, Slice::for_page(number, PAGE_SIZE))
            .await?;

        Ok(Page::new(items, number, PAGE_SIZE, total))
    }

    /// Publicly visible posts, newest first.
    pub async fn index(&self, request: PageRequest) -> Result<Page<PostEntry>, DomainError> {
        self.page(PostFilter::visible_at(self.now()), request).await
    }

    pub async fn category_posts(
        &self,
        slug: &str,
        request: PageRequest,
    ) -> Result<CategoryListing, DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|category| category.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let filter = PostFilter::visible_at(self.now()).in_category(category.id);
        let posts = self.page(filter, request).await?;

        Ok(CategoryListing { category, posts })
    }

    /// A user's posts. The owner sees drafts and scheduled posts too.
    pub async fn profile(
        &self,
        username: &str,
        requester: &Requester,
        request: PageRequest,
    ) -> Result<ProfileListing, DomainError> {
        let user = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let filter = if requester.is(user.id) {
            PostFilter::default()
        } else {
            PostFilter::visible_at(self.now())
        };
        let posts = self.page(filter.by_author(user.id), request).await?;

        Ok(ProfileListing { user, posts })
    }

    /// Hidden posts are reported as missing to everyone but their author.
    async fn visible_entry(
        &self,
        id: Uuid,
        requester: &Requester,
    ) -> Result<PostEntry, DomainError> {
        let entry = self
            .repos
            .posts
            .find_entry(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;

        if !policy::is_entry_visible(&entry, requester, self.now()) {
            tracing::debug!(post_id = %id, "Hidden post requested by non-author");
            return Err(DomainError::not_found("post", id));
        }

        Ok(entry)
    }

    /// A single post with its comments.
    pub async fn post_detail(
        &self,
        id: Uuid,
        requester: &Requester,
    ) -> Result<PostDetail, DomainError> {
        let entry = self.visible_entry(id, requester).await?;
        let comments = self.repos.comments.list_for_post(id).await?;

        Ok(PostDetail { entry, comments })
    }

    async fn load_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    async fn check_references(&self, post: &ValidPost) -> Result<(), DomainError> {
        if let Some(id) = post.category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                return Err(ValidationError::UnknownCategory(id).into());
            }
        }
        if let Some(id) = post.location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                return Err(ValidationError::UnknownLocation(id).into());
            }
        }
        Ok(())
    }

    fn apply(post: &mut Post, valid: ValidPost) {
        post.title = valid.title;
        post.text = valid.text;
        post.pub_date = valid.pub_date;
        post.is_published = valid.is_published;
        post.category_id = valid.category_id;
        post.location_id = valid.location_id;
        post.image = valid.image;
    }

    pub async fn create_post(&self, author_id: Uuid, input: PostInput) -> Result<Post, DomainError> {
        let submitted_at = self.now();
        let valid = input.validate(submitted_at)?;
        self.check_references(&valid).await?;

        let mut post = Post::new(author_id, String::new(), String::new(), submitted_at);
        post.created_at = submitted_at;
        Self::apply(&mut post, valid);

        let saved = self.repos.posts.save(post).await?;
        tracing::info!(post_id = %saved.id, %author_id, "Post created");
        Ok(saved)
    }

    /// Edit a post. A non-author gets `Forbidden`, or `NotFound` while the
    /// post is hidden from them.
    pub async fn update_post(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        let mut post = self.visible_entry(id, &Requester::User(user_id)).await?.post;
        policy::require_owner(post.author_id, user_id)?;

        let valid = input.validate_edit(post.pub_date, self.now())?;
        self.check_references(&valid).await?;
        Self::apply(&mut post, valid);

        let saved = self.repos.posts.save(post).await?;
        tracing::info!(post_id = %id, "Post updated");
        Ok(saved)
    }

    pub async fn delete_post(&self, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        let post = self.visible_entry(id, &Requester::User(user_id)).await?.post;
        policy::require_owner(post.author_id, user_id)?;

        self.repos.posts.delete(id).await?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Attach a comment to an existing post.
    // TODO: decide whether hidden posts should accept comments; today any
    // existing post id does.
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        input: CommentInput,
    ) -> Result<CommentEntry, DomainError> {
        let post = self.load_post(post_id).await?;
        let text = input.validate()?;

        let comment = Comment::new(post.id, author_id, text, self.now());
        let saved = self.repos.comments.save(comment).await?;
        tracing::info!(comment_id = %saved.id, %post_id, "Comment added");
        self.comment_entry(saved).await
    }

    /// Pair a comment with its author's current username.
    async fn comment_entry(&self, comment: Comment) -> Result<CommentEntry, DomainError> {
        let author = self
            .repos
            .users
            .find_by_id(comment.author_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", comment.author_id))?;

        Ok(CommentEntry {
            comment,
            author_username: author.username,
        })
    }

    async fn load_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment, DomainError> {
        self.repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))
    }

    pub async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
        input: CommentInput,
    ) -> Result<CommentEntry, DomainError> {
        let mut comment = self.load_comment(post_id, comment_id).await?;
        policy::require_owner(comment.author_id, user_id)?;

        comment.text = input.validate()?;
        let saved = self.repos.comments.save(comment).await?;
        self.comment_entry(saved).await
    }

    pub async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), DomainError> {
        let comment = self.load_comment(post_id, comment_id).await?;
        policy::require_owner(comment.author_id, user_id)?;

        self.repos.comments.delete(comment_id).await?;
        tracing::info!(%comment_id, %post_id, "Comment deleted");
        Ok(())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: ProfileInput,
    ) -> Result<User, DomainError> {
        let valid = input.validate()?;
        let mut user = self
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))?;

        if valid.username != user.username {
            let taken = self.repos.users.find_by_username(&valid.username).await?;
            if taken.is_some_and(|other| other.id != user.id) {
                return Err(DomainError::Duplicate(format!(
                    "username '{}' is taken",
                    valid.username
                )));
            }
        }

        user.username = valid.username;
        user.first_name = valid.first_name;
        user.last_name = valid.last_name;
        user.email = valid.email;
        user.updated_at = self.now();

        Ok(self.repos.users.save(user).await?)
    }
}
