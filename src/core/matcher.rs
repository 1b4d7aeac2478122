use crate::core::{
    keywords::KeywordExtractor,
    ranking::rank,
    similarity::{SimilarityEngine, SimilarityWeights},
    text::normalize_text,
};
use crate::models::{CandidateProfile, ScoredCandidate, ScoringWeights};

/// Keywords extracted from the request while matching
pub const MATCH_KEYWORDS: usize = 8;

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub keywords: Vec<String>,
    pub matches: Vec<ScoredCandidate>,
    pub total_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Keyword extraction and canonicalization
/// 2. Query augmentation with category and keywords
/// 3. Word + character n-gram similarity against every profile
/// 4. Boosting, ranking and truncation
#[derive(Debug, Clone)]
pub struct Matcher {
    keywords: KeywordExtractor,
    similarity: SimilarityEngine,
    weights: ScoringWeights,
    keyword_top_k: usize,
}

impl Matcher {
    pub fn new(
        keywords: KeywordExtractor,
        similarity: SimilarityWeights,
        weights: ScoringWeights,
    ) -> Self {
        Self {
            keywords,
            similarity: SimilarityEngine::new(similarity),
            weights,
            keyword_top_k: MATCH_KEYWORDS,
        }
    }

    pub fn with_defaults(keywords: KeywordExtractor) -> Self {
        Self::new(keywords, SimilarityWeights::default(), ScoringWeights::default())
    }

    pub fn with_keyword_top_k(mut self, keyword_top_k: usize) -> Self {
        self.keyword_top_k = keyword_top_k;
        self
    }

    pub fn keyword_extractor(&self) -> &KeywordExtractor {
        &self.keywords
    }

    /// Rank `candidates` for a request.
    ///
    /// # Arguments
    /// * `text` - Free-text request, may be absent
    /// * `category` - Requested category label, may be absent
    /// * `candidates` - Profiles to rank, in enumeration order
    /// * `top_k` - Maximum number of matches to return
    pub fn find_matches(
        &self,
        text: Option<&str>,
        category: Option<&str>,
        candidates: &[CandidateProfile],
        top_k: usize,
    ) -> MatchResult {
        let text = text.unwrap_or("").trim();
        let category = category.unwrap_or("").trim().to_lowercase();
        let total_candidates = candidates.len();

        if candidates.is_empty() {
            return MatchResult {
                keywords: Vec::new(),
                matches: Vec::new(),
                total_candidates,
            };
        }

        let keywords = self.keywords.extract(text, self.keyword_top_k);

        let joined = keywords.join(" ");
        let augmented = [text, category.as_str(), joined.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let query = normalize_text(&augmented);

        let profiles: Vec<String> = candidates
            .iter()
            .map(|c| normalize_text(&c.profile_text()))
            .collect();

        let similarities = self.similarity.score(&query, &profiles);
        let matches = rank(&similarities, &category, &keywords, candidates, top_k, &self.weights);

        tracing::debug!(
            "Ranked {} of {} candidates (keywords: {:?})",
            matches.len(),
            total_candidates,
            keywords
        );

        MatchResult {
            keywords,
            matches,
            total_candidates,
        }
    }
}
