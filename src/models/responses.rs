use serde::{Deserialize, Serialize};
use crate::models::domain::ScoredCandidate;

/// Candidate as shown to the requester, score in 0..1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedCandidate {
    pub id: i64,
    pub categories: Vec<String>,
    pub score: f64,
}

/// Response for the match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub keywords: Vec<String>,
    pub price: f64,
    pub matches: Vec<ScoredCandidate>,
    #[serde(rename = "matchedIds")]
    pub matched_ids: Vec<i64>,
    pub matched: Vec<MatchedCandidate>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Model,
    Heuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    pub price: f64,
    pub source: PriceSource,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
