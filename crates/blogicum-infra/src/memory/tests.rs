use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use blogicum_core::DomainError;
use blogicum_core::domain::{Category, Comment, Post, User};
use blogicum_core::input::{CommentInput, PostInput, ProfileInput, ValidationError};
use blogicum_core::pagination::PageRequest;
use blogicum_core::policy::{self, Requester};
use blogicum_core::ports::{Clock, PostFilter, Repositories};
use blogicum_core::services::BlogService;

use super::InMemoryBlogStore;
use crate::clock::FixedClock;

struct Fixture {
    repos: Repositories,
    clock: Arc<FixedClock>,
    blog: BlogService,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryBlogStore::new());
        let repos = store.repositories();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let blog = BlogService::new(repos.clone(), clock.clone());
        Self { repos, clock, blog }
    }

    fn now(&self) -> chrono::DateTime<Utc> {
        self.clock.now()
    }

    async fn user(&self, username: &str) -> User {
        self.repos
            .users
            .save(User::new(username.to_string(), "hash".to_string()))
            .await
            .unwrap()
    }

    async fn category(&self, slug: &str, published: bool) -> Category {
        self.repos
            .categories
            .save(Category::new(
                slug.to_uppercase(),
                String::new(),
                slug.to_string(),
                published,
            ))
            .await
            .unwrap()
    }

    /// Stored directly, so fixtures may use past publish dates.
    async fn post(&self, author: &User, category: Option<&Category>, offset: TimeDelta) -> Post {
        let mut post = Post::new(
            author.id,
            "Title".to_string(),
            "Body".to_string(),
            self.now() + offset,
        );
        post.category_id = category.map(|c| c.id);
        self.repos.posts.save(post).await.unwrap()
    }

    async fn comment(&self, post: &Post, author: &User) -> Comment {
        self.blog
            .create_comment(
                post.id,
                author.id,
                CommentInput {
                    text: "Nice post".to_string(),
                },
            )
            .await
            .unwrap()
            .comment
    }

    async fn index_ids(&self) -> Vec<Uuid> {
        self.blog
            .index(PageRequest::default())
            .await
            .unwrap()
            .items
            .iter()
            .map(|entry| entry.post.id)
            .collect()
    }
}

#[tokio::test]
async fn test_future_posts_hidden_from_index() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let news = fx.category("news", true).await;

    let yesterday = fx.post(&author, Some(&news), TimeDelta::days(-1)).await;
    let tomorrow = fx.post(&author, Some(&news), TimeDelta::days(1)).await;

    let ids = fx.index_ids().await;
    assert!(ids.contains(&yesterday.id));
    assert!(!ids.contains(&tomorrow.id));

    fx.clock.advance(TimeDelta::days(2));
    assert!(fx.index_ids().await.contains(&tomorrow.id));
}

#[tokio::test]
async fn test_unpublished_category_hides_its_posts() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let drafts = fx.category("drafts", false).await;
    let post = fx.post(&author, Some(&drafts), TimeDelta::hours(-1)).await;
    assert!(post.is_published);

    assert!(!fx.index_ids().await.contains(&post.id));
    assert!(matches!(
        fx.blog
            .category_posts("drafts", PageRequest::default())
            .await,
        Err(DomainError::NotFound {
            entity_type: "category",
            ..
        })
    ));
}

#[tokio::test]
async fn test_category_listing_only_shows_its_visible_posts() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let news = fx.category("news", true).await;
    let travel = fx.category("travel", true).await;

    let in_news = fx.post(&author, Some(&news), TimeDelta::hours(-2)).await;
    fx.post(&author, Some(&travel), TimeDelta::hours(-2)).await;
    let mut draft = Post::new(author.id, "d".into(), "d".into(), fx.now());
    draft.category_id = Some(news.id);
    fx.repos.posts.save(draft.unpublished()).await.unwrap();

    let listing = fx
        .blog
        .category_posts("news", PageRequest::default())
        .await
        .unwrap();

    assert_eq!(listing.category.id, news.id);
    let ids: Vec<Uuid> = listing.posts.items.iter().map(|e| e.post.id).collect();
    assert_eq!(ids, vec![in_news.id]);
}

#[tokio::test]
async fn test_listings_never_include_hidden_posts() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let open = fx.category("open", true).await;
    let closed = fx.category("closed", false).await;

    for (i, offset) in [-3i64, -1, 0, 1, 3].into_iter().enumerate() {
        let category = if i % 2 == 0 { &open } else { &closed };
        let post = fx.post(&author, Some(category), TimeDelta::hours(offset)).await;
        if i == 4 {
            fx.repos.posts.save(post.unpublished()).await.unwrap();
        }
    }

    let page = fx.blog.index(PageRequest::default()).await.unwrap();
    assert!(!page.items.is_empty());
    for entry in &page.items {
        assert!(policy::is_publicly_visible(
            &entry.post,
            entry.category.as_ref(),
            fx.now()
        ));
    }

    let stranger = Requester::User(Uuid::new_v4());
    let profile = fx
        .blog
        .profile("author", &stranger, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(profile.posts.items.len(), page.items.len());
}

#[tokio::test]
async fn test_profile_owner_sees_drafts() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    fx.post(&author, None, TimeDelta::days(-1)).await;
    fx.post(&author, None, TimeDelta::days(5)).await;

    let own = fx
        .blog
        .profile("author", &Requester::User(author.id), PageRequest::default())
        .await
        .unwrap();
    let public = fx
        .blog
        .profile("author", &Requester::Anonymous, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(own.posts.total_items, 2);
    assert_eq!(public.posts.total_items, 1);
    assert!(matches!(
        fx.blog
            .profile("nobody", &Requester::Anonymous, PageRequest::default())
            .await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_third_page_of_twenty_five_posts() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    for hours in 1..=25 {
        fx.post(&author, None, TimeDelta::hours(-hours)).await;
    }

    let page = fx.blog.index(PageRequest::Number(3)).await.unwrap();

    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total_items, 25);
    assert_eq!(page.num_pages, 3);
    let dates: Vec<_> = page.items.iter().map(|e| e.post.pub_date).collect();
    assert!(dates.windows(2).all(|pair| pair[0] > pair[1]));
    assert_eq!(dates[0], fx.now() - TimeDelta::hours(21));

    assert!(matches!(
        fx.blog.index(PageRequest::Number(4)).await,
        Err(DomainError::NotFound {
            entity_type: "page",
            ..
        })
    ));
}

#[tokio::test]
async fn test_hidden_post_detail_reported_missing() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let scheduled = fx.post(&author, None, TimeDelta::days(1)).await;

    for requester in [Requester::Anonymous, Requester::User(Uuid::new_v4())] {
        assert!(matches!(
            fx.blog.post_detail(scheduled.id, &requester).await,
            Err(DomainError::NotFound {
                entity_type: "post",
                ..
            })
        ));
    }

    let detail = fx
        .blog
        .post_detail(scheduled.id, &Requester::User(author.id))
        .await
        .unwrap();
    assert_eq!(detail.entry.post.id, scheduled.id);
    assert_eq!(detail.entry.author_username, "author");
}

#[tokio::test]
async fn test_post_detail_lists_comments_oldest_first() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let reader = fx.user("reader").await;
    let post = fx.post(&author, None, TimeDelta::hours(-1)).await;

    let first = fx.comment(&post, &reader).await;
    fx.clock.advance(TimeDelta::minutes(1));
    let second = fx.comment(&post, &author).await;

    let detail = fx
        .blog
        .post_detail(post.id, &Requester::Anonymous)
        .await
        .unwrap();

    assert_eq!(detail.entry.comment_count, 2);
    let ids: Vec<Uuid> = detail.comments.iter().map(|c| c.comment.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert_eq!(detail.comments[0].author_username, "reader");
}

#[tokio::test]
async fn test_create_post_rejects_past_publish_date() {
    let fx = Fixture::new();
    let author = fx.user("author").await;

    let result = fx
        .blog
        .create_post(
            author.id,
            PostInput {
                title: "Late".to_string(),
                text: "Too late".to_string(),
                pub_date: Some(fx.now() - TimeDelta::hours(1)),
                ..PostInput::default()
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(DomainError::Validation(ValidationError::PublishDateInPast))
    ));
    let stored = fx
        .repos
        .posts
        .count_entries(&PostFilter::default())
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_create_post_defaults_and_references() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let news = fx.category("news", true).await;

    let post = fx
        .blog
        .create_post(
            author.id,
            PostInput {
                title: "Hello".to_string(),
                text: "World".to_string(),
                category_id: Some(news.id),
                ..PostInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(post.author_id, author.id);
    assert_eq!(post.pub_date, fx.now());
    assert!(fx.index_ids().await.contains(&post.id));

    let missing = Uuid::new_v4();
    let result = fx
        .blog
        .create_post(
            author.id,
            PostInput {
                title: "Hello".to_string(),
                text: "World".to_string(),
                location_id: Some(missing),
                ..PostInput::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(DomainError::Validation(ValidationError::UnknownLocation(id))) if id == missing
    ));
}

#[tokio::test]
async fn test_only_author_may_edit_or_delete_post() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let other = fx.user("other").await;
    let post = fx.post(&author, None, TimeDelta::hours(-1)).await;
    let edit = || PostInput {
        title: "Edited".to_string(),
        text: "Edited".to_string(),
        ..PostInput::default()
    };

    assert!(matches!(
        fx.blog.update_post(post.id, other.id, edit()).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        fx.blog.delete_post(post.id, other.id).await,
        Err(DomainError::Forbidden)
    ));

    let edited = fx.blog.update_post(post.id, author.id, edit()).await.unwrap();
    assert_eq!(edited.title, "Edited");
    assert_eq!(edited.pub_date, post.pub_date);
}

#[tokio::test]
async fn test_hidden_post_mutation_looks_missing_to_non_author() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let other = fx.user("other").await;
    let scheduled = fx.post(&author, None, TimeDelta::days(1)).await;

    assert!(matches!(
        fx.blog.delete_post(scheduled.id, other.id).await,
        Err(DomainError::NotFound {
            entity_type: "post",
            ..
        })
    ));
    assert!(matches!(
        fx.blog
            .update_post(
                scheduled.id,
                other.id,
                PostInput {
                    title: "Mine".to_string(),
                    text: "x".to_string(),
                    ..PostInput::default()
                }
            )
            .await,
        Err(DomainError::NotFound { .. })
    ));

    fx.blog.delete_post(scheduled.id, author.id).await.unwrap();
    assert!(fx.repos.posts.find_by_id(scheduled.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_comment_carries_current_username() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let post = fx.post(&author, None, TimeDelta::hours(-1)).await;

    fx.blog
        .update_profile(
            author.id,
            ProfileInput {
                username: "renamed".to_string(),
                ..ProfileInput::default()
            },
        )
        .await
        .unwrap();

    let entry = fx
        .blog
        .create_comment(
            post.id,
            author.id,
            CommentInput {
                text: "Still me".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(entry.author_username, "renamed");
}

#[tokio::test]
async fn test_deleting_post_removes_its_comments() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let post = fx.post(&author, None, TimeDelta::hours(-1)).await;
    let comment = fx.comment(&post, &author).await;

    fx.blog.delete_post(post.id, author.id).await.unwrap();

    assert!(fx.repos.comments.find_by_id(comment.id).await.unwrap().is_none());
    assert!(matches!(
        fx.blog.delete_post(post.id, author.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_foreign_comment_delete_forbidden() {
    let fx = Fixture::new();
    let a = fx.user("alice").await;
    let b = fx.user("bob").await;
    let post = fx.post(&a, None, TimeDelta::hours(-1)).await;
    let comment = fx.comment(&post, &a).await;

    assert!(matches!(
        fx.blog.delete_comment(post.id, comment.id, b.id).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        fx.blog
            .update_comment(
                post.id,
                comment.id,
                b.id,
                CommentInput {
                    text: "hijacked".to_string()
                }
            )
            .await,
        Err(DomainError::Forbidden)
    ));

    let stored = fx.repos.comments.find_by_id(comment.id).await.unwrap();
    assert_eq!(stored.map(|c| c.text), Some("Nice post".to_string()));
}

#[tokio::test]
async fn test_comment_addressed_through_wrong_post_is_missing() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let post = fx.post(&author, None, TimeDelta::hours(-1)).await;
    let other_post = fx.post(&author, None, TimeDelta::hours(-2)).await;
    let comment = fx.comment(&post, &author).await;

    assert!(matches!(
        fx.blog
            .delete_comment(other_post.id, comment.id, author.id)
            .await,
        Err(DomainError::NotFound {
            entity_type: "comment",
            ..
        })
    ));

    let edited = fx
        .blog
        .update_comment(
            post.id,
            comment.id,
            author.id,
            CommentInput {
                text: " Updated ".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.comment.text, "Updated");
    assert_eq!(edited.author_username, "author");
}

#[tokio::test]
async fn test_comment_on_missing_post_fails() {
    let fx = Fixture::new();
    let author = fx.user("author").await;

    let result = fx
        .blog
        .create_comment(
            Uuid::new_v4(),
            author.id,
            CommentInput {
                text: "hello".to_string(),
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(DomainError::NotFound {
            entity_type: "post",
            ..
        })
    ));
}

#[tokio::test]
async fn test_comment_on_scheduled_post_is_accepted() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let reader = fx.user("reader").await;
    let scheduled = fx.post(&author, None, TimeDelta::days(1)).await;

    let comment = fx.comment(&scheduled, &reader).await;
    assert_eq!(comment.post_id, scheduled.id);
}

#[tokio::test]
async fn test_profile_update_keeps_usernames_unique() {
    let fx = Fixture::new();
    let alice = fx.user("alice").await;
    fx.user("bob").await;

    let result = fx
        .blog
        .update_profile(
            alice.id,
            ProfileInput {
                username: "bob".to_string(),
                ..ProfileInput::default()
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::Duplicate(_))));

    let updated = fx
        .blog
        .update_profile(
            alice.id,
            ProfileInput {
                username: "alice".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Liddell".to_string(),
                email: "alice@example.com".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.display_name(), "Alice Liddell");
}

#[tokio::test]
async fn test_deleting_category_detaches_posts() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let drafts = fx.category("drafts", false).await;
    let post = fx.post(&author, Some(&drafts), TimeDelta::hours(-1)).await;
    assert!(!fx.index_ids().await.contains(&post.id));

    fx.repos.categories.delete(drafts.id).await.unwrap();

    let stored = fx.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.category_id, None);
    assert!(fx.index_ids().await.contains(&post.id));
}

#[cfg(feature = "auth")]
mod accounts {
    use super::*;
    use crate::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
    use crate::session::InMemoryRevocationStore;
    use blogicum_core::input::RegistrationInput;
    use blogicum_core::ports::AuthError;
    use blogicum_core::services::AccountService;

    fn accounts(fx: &Fixture) -> AccountService {
        let clock: Arc<dyn Clock> = Arc::new(crate::clock::SystemClock);
        AccountService::new(
            fx.repos.users.clone(),
            Arc::new(Argon2PasswordService::fast()),
            Arc::new(JwtTokenService::new(JwtConfig {
                secret: "test-secret".to_string(),
                expiration_hours: 1,
                issuer: "blogicum-test".to_string(),
            })),
            Arc::new(InMemoryRevocationStore::new(clock.clone())),
            clock,
        )
    }

    fn registration(username: &str) -> RegistrationInput {
        RegistrationInput {
            username: username.to_string(),
            password1: "s3cret-pass".to_string(),
            password2: "s3cret-pass".to_string(),
            email: String::new(),
        }
    }

    #[tokio::test]
    async fn test_register_login_logout() {
        let fx = Fixture::new();
        let accounts = accounts(&fx);

        let session = accounts.register(registration("writer")).await.unwrap();
        let claims = accounts.authenticate(&session.token).await.unwrap();
        assert_eq!(claims.user_id, session.user.id);
        assert_eq!(claims.username, "writer");

        let login = accounts.login("writer", "s3cret-pass").await.unwrap();
        assert_eq!(login.user.id, session.user.id);

        accounts.logout(&claims).await.unwrap();
        assert!(matches!(
            accounts.authenticate(&session.token).await,
            Err(AuthError::TokenRevoked)
        ));
        assert!(accounts.authenticate(&login.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_username_and_bad_password() {
        let fx = Fixture::new();
        let accounts = accounts(&fx);
        accounts.register(registration("writer")).await.unwrap();

        assert!(matches!(
            accounts.register(registration("writer")).await,
            Err(DomainError::Duplicate(_))
        ));
        assert!(matches!(
            accounts.login("writer", "wrong-password").await,
            Err(DomainError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.login("ghost", "s3cret-pass").await,
            Err(DomainError::InvalidCredentials)
        ));
    }
}
