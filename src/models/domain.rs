use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ordered, deduplicated, lower-cased token sequence.
///
/// The comma-joined form is only used when talking to the external store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordList(Vec<String>);

impl KeywordList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a comma-separated field; empty parts are skipped.
    pub fn parse_csv(csv: &str) -> Self {
        csv.split(',').collect()
    }

    pub fn to_csv(&self) -> String {
        self.0.join(",")
    }

    /// Append a token unless it is blank or already present.
    pub fn push(&mut self, token: &str) -> bool {
        let token = token.trim().to_lowercase();
        if token.is_empty() || self.0.contains(&token) {
            return false;
        }
        self.0.push(token);
        true
    }

    /// Append every new token of `other`, keeping existing order.
    pub fn merge(&mut self, other: &KeywordList) {
        for token in &other.0 {
            self.push(token);
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = KeywordList::new();
        for token in iter {
            list.push(token.as_ref());
        }
        list
    }
}

impl From<Vec<String>> for KeywordList {
    fn from(tokens: Vec<String>) -> Self {
        tokens.into_iter().collect()
    }
}

impl From<KeywordList> for Vec<String> {
    fn from(list: KeywordList) -> Self {
        list.0
    }
}

/// Matchable entity: declared categories plus accumulated keyword history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: i64,
    pub categories: KeywordList,
    #[serde(rename = "solvedKeywords")]
    pub solved_keywords: KeywordList,
    #[serde(rename = "solvedCount", default)]
    pub solved_count: u32,
    #[serde(default)]
    pub balance: f64,
}

impl CandidateProfile {
    pub fn new(id: i64, categories: &str, solved_keywords: &str) -> Self {
        Self {
            id,
            categories: KeywordList::parse_csv(categories),
            solved_keywords: KeywordList::parse_csv(solved_keywords),
            solved_count: 0,
            balance: 0.0,
        }
    }

    /// Category list and keyword history as one lower-cased text.
    pub fn profile_text(&self) -> String {
        format!("{} {}", self.categories.to_csv(), self.solved_keywords.to_csv())
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Mentor,
}

/// Lifecycle of a matched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Matched,
    Accepted,
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            _ => Err(ParseEnumError {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "matched" => Ok(RequestStatus::Matched),
            "accepted" => Ok(RequestStatus::Accepted),
            "closed" => Ok(RequestStatus::Closed),
            _ => Err(ParseEnumError {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Matched => "matched",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// One ranked candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(rename = "candidateId")]
    pub candidate_id: i64,
    pub score: f64,
}

/// Additive boosts layered on top of the similarity score
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub category_boost: f64,
    pub keyword_boost: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category_boost: 12.0,
            keyword_boost: 6.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ClaimError {
    #[error("Request {request_id} already accepted by candidate {accepted_by}")]
    AlreadyAccepted { request_id: i64, accepted_by: i64 },

    #[error("Request {0} is closed")]
    Closed(i64),

    #[error("Candidate {candidate_id} was not matched to request {request_id}")]
    NotMatched { request_id: i64, candidate_id: i64 },
}

/// A request as persisted after matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRequest {
    pub id: i64,
    pub keywords: KeywordList,
    pub price: f64,
    #[serde(rename = "matchedIds")]
    pub matched_ids: Vec<i64>,
    pub status: RequestStatus,
    #[serde(rename = "acceptedBy")]
    pub accepted_by: Option<i64>,
}

impl MatchedRequest {
    pub fn new(id: i64, keywords: KeywordList, price: f64, matched_ids: Vec<i64>) -> Self {
        Self {
            id,
            keywords,
            price,
            matched_ids,
            status: RequestStatus::Matched,
            accepted_by: None,
        }
    }

    /// Whether the request still waits for `candidate_id` to claim it.
    pub fn is_pending_for(&self, candidate_id: i64) -> bool {
        self.accepted_by.is_none()
            && self.status != RequestStatus::Closed
            && self.matched_ids.contains(&candidate_id)
    }

    /// Claim the request for `candidate`.
    ///
    /// Re-validates membership against the stored matched list, so the caller
    /// never needs to rerun matching. On success the candidate's history,
    /// solved count and balance are updated.
    pub fn accept(&mut self, candidate: &mut CandidateProfile) -> Result<(), ClaimError> {
        if let Some(accepted_by) = self.accepted_by {
            return Err(ClaimError::AlreadyAccepted {
                request_id: self.id,
                accepted_by,
            });
        }
        match self.status {
            RequestStatus::Closed => return Err(ClaimError::Closed(self.id)),
            RequestStatus::Accepted | RequestStatus::Matched => {}
        }
        if !self.matched_ids.contains(&candidate.id) {
            return Err(ClaimError::NotMatched {
                request_id: self.id,
                candidate_id: candidate.id,
            });
        }

        self.accepted_by = Some(candidate.id);
        self.status = RequestStatus::Accepted;

        candidate.solved_count += 1;
        candidate.solved_keywords.merge(&self.keywords);
        candidate.balance += self.price;
        Ok(())
    }
}
