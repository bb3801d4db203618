use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog entry owned by its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub title: String,
    pub text: String,
    /// Moment from which the post becomes publicly visible.
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new published post without category or location.
    pub fn new(author_id: Uuid, title: String, text: String, pub_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            category_id: None,
            location_id: None,
            title,
            text,
            pub_date,
            is_published: true,
            image: None,
            created_at: Utc::now(),
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }
}
