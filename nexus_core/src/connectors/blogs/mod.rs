use crate::aggregator::{Kind, SearchResult};
use crate::error::SourceError;
use crate::normalize::{record_id, DEFAULT_DESCRIPTION};
use crate::store::{BlogPost, Store};
use crate::Source;
use async_trait::async_trait;

pub const LABEL: &str = "Nexus Blogs";

/// Published posts from the local blog store, matched on title.
pub struct BlogsConnector {
    store: Store,
    limit: usize,
}

impl BlogsConnector {
    pub fn new(store: Store, limit: usize) -> Self {
        Self { store, limit }
    }
}

pub fn map_post(post: &BlogPost, index: usize) -> SearchResult {
    let description = post
        .excerpt
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_DESCRIPTION);

    SearchResult::new(
        Kind::Blog,
        record_id(Kind::Blog, Some(post.id.clone()), index),
        post.title.clone(),
    )
    .with_description(description)
    .with_source_label(LABEL)
    .with_url(post.path())
    .with_published_at(post.published_at)
    .with_thumbnail_url(post.cover_image_url.clone())
}

#[async_trait]
impl Source for BlogsConnector {
    fn name(&self) -> &'static str {
        "blogs"
    }

    fn kind(&self) -> Kind {
        Kind::Blog
    }

    fn limit(&self) -> usize {
        self.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        let posts = self
            .store
            .search_titles(query, limit)
            .await
            .map_err(|e| SourceError::Other(format!("blog store: {}", e)))?;
        Ok(posts
            .iter()
            .enumerate()
            .map(|(i, post)| map_post(post, i))
            .collect())
    }
}
