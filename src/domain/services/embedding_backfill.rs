use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use crate::domain::entities::content_item::ContentKind;
use crate::helper::error_chain_fmt;
use crate::ports::content_store_port::{ContentStoreError, ContentStorePort};
use crate::ports::embedding_port::{EmbeddingError, EmbeddingPort};

/// Computes and persists item embeddings after creation, without blocking the
/// creator.
///
/// Each backfill is a detached fire-and-forget task: it embeds the source
/// text, writes the vector through one idempotent update, and on any failure
/// logs and stops. There is no retry and no queue, so a single provider
/// failure leaves the item permanently without an embedding. That is a known
/// eventual-consistency gap, not something this service papers over.
pub struct EmbeddingBackfillService {
    embedder: Arc<dyn EmbeddingPort>,
    content_store: Arc<dyn ContentStorePort>,
}

impl EmbeddingBackfillService {
    pub fn new(embedder: Arc<dyn EmbeddingPort>, content_store: Arc<dyn ContentStorePort>) -> Self {
        Self {
            embedder,
            content_store,
        }
    }

    /// Detaches the backfill of one item and returns immediately.
    ///
    /// The returned handle is for observation only (tests, metrics): dropping
    /// it does not cancel the task, which keeps running on the runtime. If
    /// the process dies mid-task the item simply stays un-embedded, which the
    /// system already tolerates.
    pub fn schedule_backfill(
        &self,
        kind: ContentKind,
        item_id: i64,
        source_text: String,
    ) -> JoinHandle<()> {
        let embedder = self.embedder.clone();
        let content_store = self.content_store.clone();

        tokio::spawn(
            async move {
                match backfill(embedder, content_store, kind, item_id, &source_text).await {
                    Ok(()) => info!("Backfilled embedding"),
                    // Error boundary of the detached task: log, never propagate
                    Err(error) => error!(?error, "Failed to backfill embedding"),
                }
            }
            .instrument(info_span!(
                "Embedding backfill",
                ?kind,
                item_id,
            )),
        )
    }
}

async fn backfill(
    embedder: Arc<dyn EmbeddingPort>,
    content_store: Arc<dyn ContentStorePort>,
    kind: ContentKind,
    item_id: i64,
    source_text: &str,
) -> Result<(), BackfillError> {
    let embedding = embedder.embed(source_text).await?;
    content_store.set_embedding(kind, item_id, &embedding).await?;
    Ok(())
}

#[derive(thiserror::Error)]
enum BackfillError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] ContentStoreError),
}

impl std::fmt::Debug for BackfillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
