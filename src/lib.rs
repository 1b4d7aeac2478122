//! Mentor Match - keyword-driven mentor matching and price estimation
//!
//! Free-text requests are turned into canonical keywords, scored against
//! candidate profiles with blended word and character n-gram similarity,
//! boosted on category and keyword evidence, and priced from a trained model
//! or a length heuristic.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    Canonicalizer, KeywordExtractor, Matcher, MatchResult, PriceEstimator, VocabularyStore,
};
pub use models::{CandidateProfile, MatchedRequest, ScoredCandidate, ScoringWeights};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_library_exports() {
        let vocab = VocabularyStore::new(vec![("math", vec!["calculus".to_string()])]);
        let extractor = KeywordExtractor::new(Canonicalizer::new(Arc::new(vocab)));
        assert_eq!(extractor.extract("calclus", 6), vec!["calculus"]);
        assert_eq!(PriceEstimator::heuristic().estimate(None, None), 20.0);
    }
}
