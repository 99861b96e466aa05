use async_trait::async_trait;

use crate::domain::entities::content_item::{ContentItem, ContentKind, RankedContent, RankedTitle};
use crate::helper::error_chain_fmt;

/// Port to the external content store.
///
/// The store owns the items, their counters and the author records; this core
/// only reads them and writes the single embedding field. Distance-ordered
/// scans only ever see items with a present embedding.
#[async_trait]
pub trait ContentStorePort: Send + Sync {
    /// Fetches one item by identity, embedding field included
    async fn get(
        &self,
        kind: ContentKind,
        id: i64,
    ) -> Result<Option<ContentItem>, ContentStoreError>;

    /// Sets the embedding of one item.
    ///
    /// A single idempotent single-row update: re-running it with an
    /// equivalent vector leaves the item in the same state.
    async fn set_embedding(
        &self,
        kind: ContentKind,
        id: i64,
        embedding: &[f32],
    ) -> Result<(), ContentStoreError>;

    /// Distance-ordered titles of every embedded item of one collection,
    /// ascending by distance to the query vector
    async fn nearest_titles(
        &self,
        kind: ContentKind,
        query: &[f32],
    ) -> Result<Vec<RankedTitle>, ContentStoreError>;

    /// One distance-ordered page of embedded items of one collection,
    /// hydrated with counters, tags and the author summary
    async fn nearest_content(
        &self,
        kind: ContentKind,
        query: &[f32],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RankedContent>, ContentStoreError>;
}

#[derive(thiserror::Error)]
pub enum ContentStoreError {
    #[error("Content store query failed: {0}")]
    Query(String),
}

impl std::fmt::Debug for ContentStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
