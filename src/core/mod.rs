// Core algorithm exports
pub mod artifact;
pub mod canonicalizer;
pub mod keyphrase;
pub mod keywords;
pub mod matcher;
pub mod pricing;
pub mod ranking;
pub mod similarity;
pub mod text;
pub mod vocabulary;

pub use artifact::ArtifactError;
pub use canonicalizer::{Canonicalizer, CanonicalMatch};
pub use keywords::KeywordExtractor;
pub use matcher::{Matcher, MatchResult};
pub use pricing::{PriceEstimator, PriceModel, PriceSample, Regressor};
pub use ranking::{matched_candidate_ids, overlap_score, rank};
pub use similarity::{SimilarityEngine, SimilarityWeights};
pub use vocabulary::{LabeledText, VocabularyBuilder, VocabularyStore};
