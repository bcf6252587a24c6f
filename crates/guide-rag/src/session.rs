//! Chat session: startup preflight, one-time ingestion, per-question answers

use std::sync::Arc;

use crate::config::{ApiKey, GuideConfig};
use crate::error::{Error, Result};
use crate::generation::AnsweringService;
use crate::ingestion::{IngestPipeline, IngestedDocument, KeywordImageMap};
use crate::providers::{EmbeddingProvider, InMemoryVectorStore, LlmProvider, OpenAiProvider};
use crate::retrieval::EvidenceIndex;
use crate::types::Answer;

/// A loaded guide ready to answer questions
pub struct GuideSession {
    config: GuideConfig,
    document: IngestedDocument,
    index: Arc<EvidenceIndex>,
    service: AnsweringService,
}

impl GuideSession {
    /// Start a session against the hosted OpenAI-compatible API.
    ///
    /// The credential and the document are checked before anything is
    /// extracted or sent over the network.
    pub async fn start(config: GuideConfig) -> Result<Self> {
        let api_key = Self::preflight(&config)?;
        let (embedder, llm) = OpenAiProvider::new(&config.llm, api_key)?.split();
        Self::start_with_providers(config, Arc::new(embedder), Arc::new(llm)).await
    }

    /// Validate configuration, resolve the credential and check the document exists
    pub fn preflight(config: &GuideConfig) -> Result<ApiKey> {
        config.validate()?;
        let api_key = config.llm.resolve_api_key()?;
        Self::check_document(config)?;
        Ok(api_key)
    }

    fn check_document(config: &GuideConfig) -> Result<()> {
        if config.document.pdf_path.is_file() {
            Ok(())
        } else {
            Err(Error::MissingDocument(config.document.pdf_path.clone()))
        }
    }

    /// Start a session with injected providers
    pub async fn start_with_providers(
        config: GuideConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Self::check_document(&config)?;

        tracing::info!("Loading guide {}", config.document.pdf_path.display());

        let pipeline = IngestPipeline::from_config(&config)?;
        let path = config.document.pdf_path.clone();
        let document = tokio::task::spawn_blocking(move || pipeline.ingest(&path))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        tracing::info!(
            "Ingested {} pages: {} images, {} linked keywords, {} chunks",
            document.total_pages,
            document.images.len(),
            document.keyword_map.len(),
            document.chunks.len()
        );

        let index = Arc::new(
            EvidenceIndex::build(
                document.chunks.clone(),
                embedder,
                Arc::new(InMemoryVectorStore::new()),
                config.llm.embed_batch_size,
            )
            .await?,
        );

        let service = AnsweringService::new(Arc::clone(&index), llm, config.retrieval.top_k);

        Ok(Self {
            config,
            document,
            index,
            service,
        })
    }

    /// Answer a question and attach images whose keyword appears in the answer
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let mut answer = self.service.answer(question).await?;
        answer.images = self.document.keyword_map.select_for_answer(&answer.text);
        Ok(answer)
    }

    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    pub fn document(&self) -> &IngestedDocument {
        &self.document
    }

    pub fn keyword_map(&self) -> &KeywordImageMap {
        &self.document.keyword_map
    }

    pub fn index(&self) -> &EvidenceIndex {
        &self.index
    }
}
