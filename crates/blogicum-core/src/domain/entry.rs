//! Read models assembled by the repositories for listings and detail pages.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{Category, Comment, Location, Post};

/// A post joined with its author, category, location and comment count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEntry {
    pub post: Post,
    pub author_username: String,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}

impl PostEntry {
    /// Listing order: newest publish date first, then creation time, then id.
    pub fn listing_cmp(&self, other: &Self) -> Ordering {
        other
            .post
            .pub_date
            .cmp(&self.post.pub_date)
            .then_with(|| self.post.created_at.cmp(&other.post.created_at))
            .then_with(|| self.post.id.cmp(&other.post.id))
    }
}

/// A comment joined with its author's username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author_username: String,
}
