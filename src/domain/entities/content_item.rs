use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of body characters kept when building the embedding source text of a
/// post, to bound the size of provider requests.
pub const EMBEDDED_BODY_PREFIX_CHARS: usize = 500;

/// Placeholder used in the embedding source text when an item has no tags
const EMPTY_TAGS_PLACEHOLDER: &str = "none";

/// The two content collections known to the discovery core
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Question,
}

/// A content item as seen by the discovery core.
///
/// Items are created by the external content-creation flow with `embedding:
/// None`. The embedding is set exactly once by the backfill task (and only
/// overwritten by an explicit re-backfill); an item without an embedding is
/// invisible to semantic queries. Items are never deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub kind: ContentKind,
    pub title: String,
    /// Present only for posts
    pub body: Option<String>,
    pub tags: Vec<String>,
    /// Weak reference to the authoring user
    pub author_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub embedding: Option<Vec<f32>>,
}

impl ContentItem {
    /// Builds the text sent to the embedding provider for this item.
    ///
    /// The template concatenates the semantically relevant fields: the title,
    /// the tags joined by a comma (or a fixed placeholder when there are
    /// none), and for posts a bounded prefix of the body. Questions carry no
    /// body, so only title and tags are used.
    pub fn embedding_source_text(&self) -> String {
        let tags = if self.tags.is_empty() {
            EMPTY_TAGS_PLACEHOLDER.to_string()
        } else {
            self.tags.join(", ")
        };

        match self.kind {
            ContentKind::Post => {
                let body_prefix: String = self
                    .body
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(EMBEDDED_BODY_PREFIX_CHARS)
                    .collect();
                format!(
                    "title: {}; tags: {}; body: {}",
                    self.title, tags, body_prefix
                )
            }
            ContentKind::Question => {
                format!("question title: {}; tags: {}", self.title, tags)
            }
        }
    }
}

/// Counters owned by the external content store, read-only to this core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStats {
    pub total_likes: i64,
    pub total_favorites: i64,
    pub total_comments: i64,
}

/// Author fields joined onto search results.
///
/// Missing fields default to the empty string, never null, so the result
/// shape stays stable for consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: String,
    pub nickname: String,
    pub avatar: String,
}

/// A `(title, distance)` pair from a distance-ordered scan of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTitle {
    pub title: String,
    pub distance: f32,
}

/// A hydrated search result row: the item joined with its counters, tags and
/// author summary, plus its distance to the query vector.
///
/// Produced transiently by a query and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedContent {
    pub id: i64,
    pub kind: ContentKind,
    pub title: String,
    /// Empty string for questions
    pub body: String,
    /// RFC 3339 timestamp, or the empty string when unknown
    pub published_at: String,
    pub total_likes: i64,
    pub total_favorites: i64,
    pub total_comments: i64,
    pub author: AuthorSummary,
    pub tags: Vec<String>,
    pub distance: f32,
}
