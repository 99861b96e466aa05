use std::sync::Arc;
use tracing::info;

use crate::configuration::Settings;
use crate::domain::services::avatar_generation::AvatarGenerationService;
use crate::domain::services::embedding_backfill::EmbeddingBackfillService;
use crate::domain::services::semantic_search::SemanticSearchService;
use crate::ports::content_store_port::ContentStorePort;
use crate::ports::embedding_port::EmbeddingPort;
use crate::ports::image_generation_port::ImageGenerationPort;
use crate::repositories::dashscope_embedding_repository::DashScopeEmbeddingRepository;
use crate::repositories::dashscope_image_repository::DashScopeImageRepository;

/// The wired discovery core: the three services sharing the provider
/// adapters and the caller-supplied content store.
///
/// The content store is an external collaborator, so its adapter is injected
/// rather than built here; request handlers hold this application and call
/// into the services.
pub struct Application {
    semantic_search: Arc<SemanticSearchService>,
    embedding_backfill: Arc<EmbeddingBackfillService>,
    avatar_generation: Arc<AvatarGenerationService>,
}

impl Application {
    #[tracing::instrument(name = "Building discovery application", skip(settings, content_store))]
    pub fn build(
        settings: Settings,
        content_store: Arc<dyn ContentStorePort>,
    ) -> Result<Self, ApplicationError> {
        let embedder: Arc<dyn EmbeddingPort> =
            Arc::new(DashScopeEmbeddingRepository::try_new(&settings.dashscope)?);
        let image_provider: Arc<dyn ImageGenerationPort> =
            Arc::new(DashScopeImageRepository::try_new(&settings.dashscope)?);

        let application = Self::with_ports(embedder, image_provider, content_store);
        info!("Discovery application built ✅");

        Ok(application)
    }

    /// Wires the services over explicit ports, used by `build` and by tests
    /// substituting fake providers
    pub fn with_ports(
        embedder: Arc<dyn EmbeddingPort>,
        image_provider: Arc<dyn ImageGenerationPort>,
        content_store: Arc<dyn ContentStorePort>,
    ) -> Self {
        let semantic_search = Arc::new(SemanticSearchService::new(
            embedder.clone(),
            content_store.clone(),
        ));
        let embedding_backfill =
            Arc::new(EmbeddingBackfillService::new(embedder, content_store));
        let avatar_generation = Arc::new(AvatarGenerationService::new(image_provider));

        Self {
            semantic_search,
            embedding_backfill,
            avatar_generation,
        }
    }

    pub fn semantic_search(&self) -> Arc<SemanticSearchService> {
        self.semantic_search.clone()
    }

    pub fn embedding_backfill(&self) -> Arc<EmbeddingBackfillService> {
        self.embedding_backfill.clone()
    }

    pub fn avatar_generation(&self) -> Arc<AvatarGenerationService> {
        self.avatar_generation.clone()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ApplicationError {
    #[error("Failed to build the provider HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
