use crate::config::{ArtifactSettings, MatchingSettings};
use crate::core::{
    ArtifactError, Canonicalizer, KeywordExtractor, Matcher, PriceEstimator, VocabularyStore,
};
use crate::models::ScoringWeights;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Everything needed to serve matching and pricing, built from loaded artifacts
#[derive(Debug, Clone)]
pub struct MatchEngine {
    pub matcher: Matcher,
    pub pricing: PriceEstimator,
}

impl MatchEngine {
    pub fn new(
        vocabulary: VocabularyStore,
        pricing: PriceEstimator,
        matching: &MatchingSettings,
        scoring: ScoringWeights,
    ) -> Self {
        let canonicalizer = Canonicalizer::with_cutoff(Arc::new(vocabulary), matching.canonical_cutoff);
        let matcher = Matcher::new(
            KeywordExtractor::new(canonicalizer),
            matching.similarity_weights(),
            scoring,
        )
        .with_keyword_top_k(matching.match_keyword_top_k);
        Self { matcher, pricing }
    }

    pub fn keywords(&self, text: &str, top_k: usize) -> Vec<String> {
        self.matcher.keyword_extractor().extract(text, top_k)
    }
}

/// Lazily loads the vocabulary and price model once.
///
/// The first successful load wins. A failed load is reported to the caller
/// and attempted again on the next call.
#[derive(Debug)]
pub struct ArtifactStore {
    artifacts: ArtifactSettings,
    matching: MatchingSettings,
    scoring: ScoringWeights,
    engine: OnceCell<Arc<MatchEngine>>,
}

impl ArtifactStore {
    pub fn new(artifacts: ArtifactSettings, matching: MatchingSettings, scoring: ScoringWeights) -> Self {
        Self {
            artifacts,
            matching,
            scoring,
            engine: OnceCell::new(),
        }
    }

    /// Store whose engine is already built.
    pub fn preloaded(engine: MatchEngine, matching: MatchingSettings) -> Self {
        Self {
            artifacts: ArtifactSettings::default(),
            matching,
            scoring: ScoringWeights::default(),
            engine: OnceCell::from(Arc::new(engine)),
        }
    }

    pub fn matching(&self) -> &MatchingSettings {
        &self.matching
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    pub async fn engine(&self) -> Result<Arc<MatchEngine>, ArtifactError> {
        self.engine
            .get_or_try_init(|| async { self.load().map(Arc::new) })
            .await
            .cloned()
    }

    fn load(&self) -> Result<MatchEngine, ArtifactError> {
        let vocabulary = VocabularyStore::load_or_empty(&self.artifacts.vocabulary_path)
            .inspect_err(|e| tracing::error!("Failed to load vocabulary: {}", e))?;
        let pricing = PriceEstimator::load_or_fallback(&self.artifacts.price_model_path)
            .inspect_err(|e| tracing::error!("Failed to load price model: {}", e))?;

        tracing::info!(
            "Artifacts loaded ({} vocabulary categories, price model: {})",
            vocabulary.len(),
            pricing.has_model()
        );
        Ok(MatchEngine::new(vocabulary, pricing, &self.matching, self.scoring))
    }
}
