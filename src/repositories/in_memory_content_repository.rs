use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::domain::entities::content_item::{
    AuthorSummary, ContentItem, ContentKind, ContentStats, RankedContent, RankedTitle,
};
use crate::ports::content_store_port::{ContentStoreError, ContentStorePort};

/// In-memory reference adapter of the content store port.
///
/// Items live in a BTreeMap keyed by `(kind, id)`, so scans run in ascending
/// id order and equal-distance results stay deterministic. Distance is cosine
/// distance, matching the `<=>` operator of the pgvector deployment this
/// adapter stands in for.
#[derive(Default)]
pub struct InMemoryContentRepository {
    items: RwLock<BTreeMap<(ContentKind, i64), StoredContent>>,
    authors: RwLock<BTreeMap<i64, StoredAuthor>>,
}

struct StoredContent {
    item: ContentItem,
    stats: ContentStats,
}

struct StoredAuthor {
    nickname: String,
    avatar: String,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an item together with its derived counters.
    ///
    /// Creation itself belongs to the external content flow; this method is
    /// how that flow hands items to the adapter.
    pub fn insert_content(&self, item: ContentItem, stats: ContentStats) {
        let mut items = self.items.write().expect("content lock poisoned");
        items.insert((item.kind, item.id), StoredContent { item, stats });
    }

    /// Registers an author record used to hydrate search results
    pub fn register_author(&self, id: i64, nickname: &str, avatar: &str) {
        let mut authors = self.authors.write().expect("author lock poisoned");
        authors.insert(
            id,
            StoredAuthor {
                nickname: nickname.to_string(),
                avatar: avatar.to_string(),
            },
        );
    }

    /// Distance-ordered scan over the embedded items of one collection
    fn scan(
        &self,
        kind: ContentKind,
        query: &[f32],
    ) -> Result<Vec<(ContentItem, ContentStats, f32)>, ContentStoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| ContentStoreError::Query("content lock poisoned".into()))?;

        let mut scored: Vec<(ContentItem, ContentStats, f32)> = items
            .values()
            .filter(|stored| stored.item.kind == kind)
            .filter_map(|stored| {
                stored.item.embedding.as_ref().map(|embedding| {
                    (
                        stored.item.clone(),
                        stored.stats,
                        cosine_distance(query, embedding),
                    )
                })
            })
            .collect();

        // Stable sort: equal distances keep the ascending-id scan order
        scored.sort_by(|a, b| a.2.total_cmp(&b.2));

        Ok(scored)
    }

    fn author_summary(&self, author_id: Option<i64>) -> Result<AuthorSummary, ContentStoreError> {
        let authors = self
            .authors
            .read()
            .map_err(|_| ContentStoreError::Query("author lock poisoned".into()))?;

        let Some(author_id) = author_id else {
            return Ok(AuthorSummary::default());
        };

        Ok(match authors.get(&author_id) {
            Some(author) => AuthorSummary {
                id: author_id.to_string(),
                nickname: author.nickname.clone(),
                avatar: author.avatar.clone(),
            },
            // A dangling author reference still yields a stable, empty shape
            None => AuthorSummary {
                id: author_id.to_string(),
                ..AuthorSummary::default()
            },
        })
    }
}

#[async_trait]
impl ContentStorePort for InMemoryContentRepository {
    async fn get(
        &self,
        kind: ContentKind,
        id: i64,
    ) -> Result<Option<ContentItem>, ContentStoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| ContentStoreError::Query("content lock poisoned".into()))?;

        Ok(items.get(&(kind, id)).map(|stored| stored.item.clone()))
    }

    async fn set_embedding(
        &self,
        kind: ContentKind,
        id: i64,
        embedding: &[f32],
    ) -> Result<(), ContentStoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| ContentStoreError::Query("content lock poisoned".into()))?;

        match items.get_mut(&(kind, id)) {
            Some(stored) => {
                stored.item.embedding = Some(embedding.to_vec());
                Ok(())
            }
            None => Err(ContentStoreError::Query(format!(
                "no {:?} with id {} to update",
                kind, id
            ))),
        }
    }

    async fn nearest_titles(
        &self,
        kind: ContentKind,
        query: &[f32],
    ) -> Result<Vec<RankedTitle>, ContentStoreError> {
        Ok(self
            .scan(kind, query)?
            .into_iter()
            .map(|(item, _, distance)| RankedTitle {
                title: item.title,
                distance,
            })
            .collect())
    }

    async fn nearest_content(
        &self,
        kind: ContentKind,
        query: &[f32],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RankedContent>, ContentStoreError> {
        let page = self.scan(kind, query)?;

        page.into_iter()
            .skip(offset)
            .take(limit)
            .map(|(item, stats, distance)| {
                Ok(RankedContent {
                    id: item.id,
                    kind: item.kind,
                    title: item.title,
                    body: item.body.unwrap_or_default(),
                    published_at: item
                        .created_at
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_default(),
                    total_likes: stats.total_likes,
                    total_favorites: stats.total_favorites,
                    total_comments: stats.total_comments,
                    author: self.author_summary(item.author_id)?,
                    tags: item.tags,
                    distance,
                })
            })
            .collect()
    }
}

/// Cosine distance between two vectors: `1 - cosine similarity`, in `[0, 2]`.
///
/// A zero-magnitude vector has no direction; its distance to anything is 1.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}
