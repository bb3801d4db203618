use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category entity - a named grouping of posts with its own published flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Unique URL identifier.
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(title: String, description: String, slug: String, is_published: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            slug,
            is_published,
            created_at: Utc::now(),
        }
    }
}
