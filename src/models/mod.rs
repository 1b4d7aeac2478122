// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CandidateProfile, ClaimError, KeywordList, MatchedRequest, ParseEnumError, RequestStatus, Role, ScoredCandidate, ScoringWeights};
pub use requests::{CandidateRecord, KeywordsRequest, MatchRequest, PriceRequest};
pub use responses::{ErrorResponse, HealthResponse, KeywordsResponse, MatchResponse, MatchedCandidate, PriceResponse, PriceSource};
