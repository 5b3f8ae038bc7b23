use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user account. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
}

/// One search a signed-in user ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub query: String,
    /// `all` or the requested kinds, comma-separated.
    pub search_type: String,
    pub results_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub slug: String,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub reading_time: i64,
    pub cover_image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Site-relative link to the post.
    pub fn path(&self) -> String {
        format!("/blog/{}", self.slug)
    }
}

/// Fields for a new post. Unset derived fields are computed from content.
#[derive(Debug, Clone, Default)]
pub struct NewBlog {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub cover_image_url: Option<String>,
    pub reading_time: Option<i64>,
    pub is_published: bool,
}

/// Partial update; `None` leaves a field unchanged. An empty `excerpt` or
/// `cover_image_url` clears it.
#[derive(Debug, Clone, Default)]
pub struct BlogUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover_image_url: Option<String>,
    pub reading_time: Option<i64>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BlogListQuery {
    pub featured: bool,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for BlogListQuery {
    fn default() -> Self {
        Self {
            featured: false,
            search: None,
            limit: 12,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlogStatus {
    #[default]
    All,
    Published,
    Drafts,
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlogStatus::All => "all",
            BlogStatus::Published => "published",
            BlogStatus::Drafts => "drafts",
        })
    }
}

impl FromStr for BlogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(BlogStatus::All),
            "published" => Ok(BlogStatus::Published),
            "drafts" | "draft" => Ok(BlogStatus::Drafts),
            other => Err(format!(
                "unknown status '{}' (expected all, published or drafts)",
                other
            )),
        }
    }
}
