//! Visibility and authorization rules for posts and comments.
//!
//! Every function here is a pure predicate over already loaded data. Callers
//! decide how a failed check surfaces: a hidden post is reported as missing,
//! a foreign post or comment as forbidden.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, Post, PostEntry};
use crate::error::DomainError;

/// Who is asking: an anonymous visitor or an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requester {
    #[default]
    Anonymous,
    User(Uuid),
}

impl Requester {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(*id),
        }
    }

    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id() == Some(user_id)
    }
}

impl From<Option<Uuid>> for Requester {
    fn from(user_id: Option<Uuid>) -> Self {
        user_id.map_or(Self::Anonymous, Self::User)
    }
}

/// Visibility to the public: published, in a published category (if any),
/// and not scheduled for the future.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && category.is_none_or(|c| c.is_published) && post.pub_date <= now
}

/// Visibility to a specific requester. Authors always see their own posts.
pub fn is_visible(
    post: &Post,
    category: Option<&Category>,
    requester: &Requester,
    now: DateTime<Utc>,
) -> bool {
    requester.is(post.author_id) || is_publicly_visible(post, category, now)
}

pub fn is_entry_visible(entry: &PostEntry, requester: &Requester, now: DateTime<Utc>) -> bool {
    is_visible(&entry.post, entry.category.as_ref(), requester, now)
}

/// Keep only publicly visible entries, preserving their order.
pub fn filter_visible_posts<I>(entries: I, now: DateTime<Utc>) -> Vec<PostEntry>
where
    I: IntoIterator<Item = PostEntry>,
{
    entries
        .into_iter()
        .filter(|entry| is_publicly_visible(&entry.post, entry.category.as_ref(), now))
        .collect()
}

pub fn can_mutate_post(post: &Post, requester: &Requester) -> bool {
    requester.is(post.author_id)
}

pub fn can_mutate_comment(comment: &Comment, requester: &Requester) -> bool {
    requester.is(comment.author_id)
}

/// Guard for protected actions: yields the authenticated user's id.
pub fn require_authenticated(requester: &Requester) -> Result<Uuid, DomainError> {
    requester.user_id().ok_or(DomainError::Unauthenticated)
}

/// Guard for mutations: the acting user must own the target.
pub fn require_owner(owner_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
    if owner_id == user_id {
        Ok(())
    } else {
        tracing::debug!(%owner_id, %user_id, "Ownership check failed");
        Err(DomainError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn category(published: bool) -> Category {
        Category::new(
            "News".to_string(),
            "Daily news".to_string(),
            "news".to_string(),
            published,
        )
    }

    fn entry(post: Post, category: Option<Category>) -> PostEntry {
        PostEntry {
            post,
            author_username: "author".to_string(),
            category,
            location: None,
            comment_count: 0,
        }
    }

    #[test]
    fn test_anonymous_visibility_matches_all_three_flags() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let yesterday = now - TimeDelta::days(1);
        let tomorrow = now + TimeDelta::days(1);

        for published in [true, false] {
            for category_published in [true, false] {
                for pub_date in [yesterday, now, tomorrow] {
                    let mut post = Post::new(author, "t".into(), "x".into(), pub_date);
                    post.is_published = published;
                    let cat = category(category_published);

                    let expected = published && category_published && pub_date <= now;
                    assert_eq!(
                        is_visible(&post, Some(&cat), &Requester::Anonymous, now),
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn test_author_always_sees_own_post() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let post = Post::new(author, "t".into(), "x".into(), now + TimeDelta::days(3)).unpublished();
        let cat = category(false);

        assert!(is_visible(&post, Some(&cat), &Requester::User(author), now));
        assert!(!is_visible(
            &post,
            Some(&cat),
            &Requester::User(Uuid::new_v4()),
            now
        ));
    }

    #[test]
    fn test_post_without_category_only_needs_own_flags() {
        let now = Utc::now();
        let post = Post::new(Uuid::new_v4(), "t".into(), "x".into(), now);
        assert!(is_publicly_visible(&post, None, now));
    }

    #[test]
    fn test_filter_visible_posts_keeps_order() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let a = Post::new(author, "a".into(), "x".into(), now - TimeDelta::hours(1));
        let hidden = Post::new(author, "h".into(), "x".into(), now + TimeDelta::hours(1));
        let b = Post::new(author, "b".into(), "x".into(), now - TimeDelta::hours(2));
        let in_draft_category = Post::new(author, "d".into(), "x".into(), now);

        let visible = filter_visible_posts(
            vec![
                entry(a.clone(), Some(category(true))),
                entry(hidden, None),
                entry(b.clone(), None),
                entry(in_draft_category, Some(category(false))),
            ],
            now,
        );

        let ids: Vec<Uuid> = visible.iter().map(|e| e.post.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_mutation_requires_author() {
        let author = Uuid::new_v4();
        let other = Uuid::new_v4();
        let post = Post::new(author, "t".into(), "x".into(), Utc::now());
        let comment = Comment::new(post.id, author, "hi".into(), Utc::now());

        assert!(can_mutate_post(&post, &Requester::User(author)));
        assert!(!can_mutate_post(&post, &Requester::User(other)));
        assert!(!can_mutate_post(&post, &Requester::Anonymous));
        assert!(can_mutate_comment(&comment, &Requester::User(author)));
        assert!(!can_mutate_comment(&comment, &Requester::User(other)));
    }

    #[test]
    fn test_guards() {
        let user = Uuid::new_v4();
        assert!(matches!(
            require_authenticated(&Requester::Anonymous),
            Err(DomainError::Unauthenticated)
        ));
        assert_eq!(require_authenticated(&Requester::User(user)).unwrap(), user);
        assert!(require_owner(user, user).is_ok());
        assert!(matches!(
            require_owner(user, Uuid::new_v4()),
            Err(DomainError::Forbidden)
        ));
    }
}
