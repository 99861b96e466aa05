use futures::future::try_join;
use std::collections::HashSet;
use std::iter::Peekable;
use std::sync::Arc;
use tracing::error;

use crate::domain::entities::content_item::{ContentKind, RankedContent, RankedTitle};
use crate::helper::error_chain_fmt;
use crate::ports::content_store_port::{ContentStoreError, ContentStorePort};
use crate::ports::embedding_port::{EmbeddingError, EmbeddingPort};

/// Maximum number of deduplicated titles returned by `suggest`
pub const SUGGESTION_LIMIT: usize = 7;

/// Keywords shorter than this (trimmed) are not worth a provider call
pub const MIN_SUGGESTION_KEYWORD_CHARS: usize = 2;

/// Answers the two semantic query shapes against the content store: the
/// cross-type suggestion list and the per-type paginated search.
///
/// Query failures never reach the caller: both operations degrade to an empty
/// result, indistinguishable from "no matches".
pub struct SemanticSearchService {
    embedder: Arc<dyn EmbeddingPort>,
    content_store: Arc<dyn ContentStorePort>,
}

impl SemanticSearchService {
    pub fn new(embedder: Arc<dyn EmbeddingPort>, content_store: Arc<dyn ContentStorePort>) -> Self {
        Self {
            embedder,
            content_store,
        }
    }

    /// Deduplicated titles of the closest items across both collections, at
    /// most [`SUGGESTION_LIMIT`] of them, ascending by distance.
    #[tracing::instrument(name = "Computing search suggestions", skip(self))]
    pub async fn suggest(&self, keyword: &str) -> Vec<String> {
        match self.ranked_suggestions(keyword).await {
            Ok(titles) => titles,
            Err(SemanticSearchError::KeywordTooShort(_)) => Vec::new(),
            Err(error) => {
                error!(?error, "Failed to compute search suggestions");
                Vec::new()
            }
        }
    }

    async fn ranked_suggestions(
        &self,
        keyword: &str,
    ) -> Result<Vec<String>, SemanticSearchError> {
        if keyword.trim().chars().count() < MIN_SUGGESTION_KEYWORD_CHARS {
            return Err(SemanticSearchError::KeywordTooShort(
                MIN_SUGGESTION_KEYWORD_CHARS,
            ));
        }

        let query = self.embedder.embed(keyword).await?;

        let (posts, questions) = try_join(
            self.content_store.nearest_titles(ContentKind::Post, &query),
            self.content_store
                .nearest_titles(ContentKind::Question, &query),
        )
        .await?;

        Ok(merge_ranked_titles(posts, questions, SUGGESTION_LIMIT))
    }

    /// One page of the requested collection, ascending by distance to the
    /// keyword, hydrated with counters, tags and the author summary.
    ///
    /// Pages are computed against the live embedded set: a backfill landing
    /// between two calls can shift ranks, so sequential pages are not
    /// guaranteed to be mutually consistent. Within a single call the
    /// distances are non-decreasing.
    #[tracing::instrument(name = "Semantic search", skip(self))]
    pub async fn search(
        &self,
        keyword: &str,
        kind: ContentKind,
        page: usize,
        limit: usize,
    ) -> Vec<RankedContent> {
        if keyword.trim().is_empty() {
            return Vec::new();
        }

        match self.ranked_search(keyword, kind, page, limit).await {
            Ok(results) => results,
            Err(error) => {
                error!(?error, "Failed to execute semantic search");
                Vec::new()
            }
        }
    }

    async fn ranked_search(
        &self,
        keyword: &str,
        kind: ContentKind,
        page: usize,
        limit: usize,
    ) -> Result<Vec<RankedContent>, SemanticSearchError> {
        let query = self.embedder.embed(keyword).await?;
        let offset = page.saturating_sub(1) * limit;

        Ok(self
            .content_store
            .nearest_content(kind, &query, offset, limit)
            .await?)
    }
}

/// Merges two distance-ordered title streams into one ascending sequence,
/// collapsing duplicate titles onto their smallest distance, truncated to
/// `limit` groups.
///
/// The merge is stable: on equal distance the first stream wins, and within a
/// stream the store's scan order is preserved, so a given pair of responses
/// always produces the same output.
fn merge_ranked_titles(
    posts: Vec<RankedTitle>,
    questions: Vec<RankedTitle>,
    limit: usize,
) -> Vec<String> {
    let mut titles = Vec::with_capacity(limit);
    let mut seen: HashSet<String> = HashSet::new();

    let mut posts = posts.into_iter().peekable();
    let mut questions = questions.into_iter().peekable();

    while titles.len() < limit {
        let Some(next) = take_closest(&mut posts, &mut questions) else {
            break;
        };

        // Both streams are ascending, so the first occurrence of a title is
        // also its smallest distance
        if seen.insert(next.title.clone()) {
            titles.push(next.title);
        }
    }

    titles
}

fn take_closest<I, J>(first: &mut Peekable<I>, second: &mut Peekable<J>) -> Option<RankedTitle>
where
    I: Iterator<Item = RankedTitle>,
    J: Iterator<Item = RankedTitle>,
{
    match (first.peek(), second.peek()) {
        (Some(a), Some(b)) => {
            if a.distance <= b.distance {
                first.next()
            } else {
                second.next()
            }
        }
        (Some(_), None) => first.next(),
        (None, _) => second.next(),
    }
}

#[derive(thiserror::Error)]
pub enum SemanticSearchError {
    #[error("Keyword shorter than {0} characters")]
    KeywordTooShort(usize),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] ContentStoreError),
}

impl std::fmt::Debug for SemanticSearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
