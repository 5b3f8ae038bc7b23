use super::models::{BlogListQuery, BlogPost, BlogStatus, BlogUpdate, NewBlog};
use super::{conflict_on_unique, Store, StoreError};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

const BLOG_COLUMNS: &str = "id, user_id, title, content, excerpt, slug, tags, is_published, \
     is_featured, view_count, like_count, comment_count, reading_time, cover_image_url, \
     published_at, created_at, updated_at";

const SLUG_TAKEN: &str = "A blog with this slug already exists";
const NOT_OWNED: &str = "Blog not found or unauthorized";

pub const EXCERPT_CHARS: usize = 160;
pub const WORDS_PER_MINUTE: usize = 200;

static SLUG_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9 -]").expect("valid slug regex"));
static DASHES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s-]+").expect("valid dash regex"));

/// `"Hello, World! 2024"` -> `"hello-world-2024"`.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(&lower, "");
    DASHES_RE
        .replace_all(stripped.trim(), "-")
        .trim_matches('-')
        .to_string()
}

/// First 160 characters of the trimmed content, followed by `...`.
pub fn default_excerpt(content: &str) -> String {
    let head: String = content.trim().chars().take(EXCERPT_CHARS).collect();
    format!("{}...", head)
}

/// Minutes to read at 200 words per minute, rounded up.
pub fn reading_time_minutes(content: &str) -> i64 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as i64
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn blog_from_row(row: &SqliteRow) -> Result<BlogPost, StoreError> {
    let tags: String = row.try_get("tags")?;
    Ok(BlogPost {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        excerpt: row.try_get("excerpt")?,
        slug: row.try_get("slug")?,
        tags: serde_json::from_str(&tags)?,
        is_published: row.try_get("is_published")?,
        is_featured: row.try_get("is_featured")?,
        view_count: row.try_get("view_count")?,
        like_count: row.try_get("like_count")?,
        comment_count: row.try_get("comment_count")?,
        reading_time: row.try_get("reading_time")?,
        cover_image_url: row.try_get("cover_image_url")?,
        published_at: row.try_get::<Option<DateTime<Utc>>, _>("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Store {
    /// Published posts, newest first.
    pub async fn list_published(
        &self,
        query: &BlogListQuery,
    ) -> Result<Vec<BlogPost>, StoreError> {
        let mut sql = format!("SELECT {} FROM blogs WHERE is_published = 1", BLOG_COLUMNS);
        if query.featured {
            sql.push_str(" AND is_featured = 1");
        }
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        if pattern.is_some() {
            sql.push_str(
                r" AND (title LIKE ? ESCAPE '\' OR excerpt LIKE ? ESCAPE '\' OR content LIKE ? ESCAPE '\')",
            );
        }
        sql.push_str(" ORDER BY published_at DESC, created_at DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query(&sql);
        if let Some(p) = &pattern {
            q = q.bind(p.clone()).bind(p.clone()).bind(p.clone());
        }
        let rows = q
            .bind(query.limit.max(0))
            .bind(query.offset.max(0))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(blog_from_row).collect()
    }

    /// Every post owned by `user_id`, most recently edited first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        status: BlogStatus,
    ) -> Result<Vec<BlogPost>, StoreError> {
        let filter = match status {
            BlogStatus::All => "",
            BlogStatus::Published => " AND is_published = 1",
            BlogStatus::Drafts => " AND is_published = 0",
        };
        let sql = format!(
            "SELECT {} FROM blogs WHERE user_id = ?{} ORDER BY updated_at DESC",
            BLOG_COLUMNS, filter
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(blog_from_row).collect()
    }

    /// A published post by slug. Each read counts as a view.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<BlogPost, StoreError> {
        let sql = format!(
            "SELECT {} FROM blogs WHERE slug = ? AND is_published = 1",
            BLOG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("Blog not found".into()))?;
        let mut blog = blog_from_row(&row)?;

        sqlx::query("UPDATE blogs SET view_count = view_count + 1 WHERE id = ?")
            .bind(&blog.id)
            .execute(&self.pool)
            .await?;
        blog.view_count += 1;

        Ok(blog)
    }

    async fn get_owned(&self, id: &str, user_id: &str) -> Result<BlogPost, StoreError> {
        let sql = format!("SELECT {} FROM blogs WHERE id = ? AND user_id = ?", BLOG_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(NOT_OWNED.into()))?;
        blog_from_row(&row)
    }

    pub async fn create_blog(&self, user_id: &str, new: NewBlog) -> Result<BlogPost, StoreError> {
        let title = new.title.trim().to_string();
        let content = new.content.trim().to_string();
        if title.is_empty() || content.is_empty() {
            return Err(StoreError::Validation(
                "Title and content are required".into(),
            ));
        }

        let slug = non_empty(new.slug).unwrap_or_else(|| slugify(&title));
        if slug.is_empty() {
            return Err(StoreError::Validation(
                "Title must contain at least one letter or digit".into(),
            ));
        }
        let excerpt = non_empty(new.excerpt).unwrap_or_else(|| default_excerpt(&content));
        let reading_time = new
            .reading_time
            .filter(|m| *m > 0)
            .unwrap_or_else(|| reading_time_minutes(&content));
        let tags = serde_json::to_string(&clean_tags(new.tags))?;
        let now = Utc::now();
        let published_at = new.is_published.then_some(now);
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO blogs (
                id, user_id, title, content, excerpt, slug, tags, cover_image_url,
                reading_time, is_published, published_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&title)
        .bind(&content)
        .bind(&excerpt)
        .bind(&slug)
        .bind(&tags)
        .bind(non_empty(new.cover_image_url))
        .bind(reading_time)
        .bind(new.is_published)
        .bind(published_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, SLUG_TAKEN))?;

        info!(blog_id = %id, slug = %slug, published = new.is_published, "Created blog");
        self.get_owned(&id, user_id).await
    }

    /// Apply a partial update to a post owned by `user_id`.
    pub async fn update_blog(
        &self,
        id: &str,
        user_id: &str,
        update: BlogUpdate,
    ) -> Result<BlogPost, StoreError> {
        let mut blog = self.get_owned(id, user_id).await?;
        let now = Utc::now();

        if let Some(title) = update.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(StoreError::Validation("Title must not be empty".into()));
            }
            blog.title = title;
        }
        if let Some(content) = update.content {
            let content = content.trim().to_string();
            if content.is_empty() {
                return Err(StoreError::Validation("Content must not be empty".into()));
            }
            blog.content = content;
        }
        if let Some(excerpt) = update.excerpt {
            blog.excerpt = non_empty(Some(excerpt));
        }
        if let Some(slug) = update.slug {
            let slug = slug.trim().to_string();
            if slug.is_empty() {
                return Err(StoreError::Validation("Slug must not be empty".into()));
            }
            blog.slug = slug;
        }
        if let Some(tags) = update.tags {
            blog.tags = clean_tags(tags);
        }
        if let Some(cover) = update.cover_image_url {
            blog.cover_image_url = non_empty(Some(cover));
        }
        if let Some(minutes) = update.reading_time {
            blog.reading_time = minutes.max(0);
        }
        if let Some(published) = update.is_published {
            blog.is_published = published;
            blog.published_at = published.then_some(now);
        }
        if let Some(featured) = update.is_featured {
            blog.is_featured = featured;
        }

        sqlx::query(
            r#"
            UPDATE blogs SET
                title = ?, content = ?, excerpt = ?, slug = ?, tags = ?,
                cover_image_url = ?, reading_time = ?, is_published = ?,
                is_featured = ?, published_at = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&blog.title)
        .bind(&blog.content)
        .bind(&blog.excerpt)
        .bind(&blog.slug)
        .bind(serde_json::to_string(&blog.tags)?)
        .bind(&blog.cover_image_url)
        .bind(blog.reading_time)
        .bind(blog.is_published)
        .bind(blog.is_featured)
        .bind(blog.published_at)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, SLUG_TAKEN))?;

        debug!(blog_id = %id, "Updated blog");
        self.get_owned(id, user_id).await
    }

    pub async fn delete_blog(&self, id: &str, user_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(NOT_OWNED.into()));
        }
        info!(blog_id = %id, "Deleted blog");
        Ok(())
    }

    /// Published posts whose title contains `query`, for the blog search source.
    pub async fn search_titles(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<BlogPost>, StoreError> {
        let sql = format!(
            r"SELECT {} FROM blogs WHERE is_published = 1 AND title LIKE ? ESCAPE '\'
              ORDER BY published_at DESC LIMIT ?",
            BLOG_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(like_pattern(query.trim()))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(blog_from_row).collect()
    }
}
