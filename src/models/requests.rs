use crate::core::keywords;
use crate::models::domain::{CandidateProfile, KeywordList, ParseEnumError, Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Candidate row as handed over by the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: i64,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(alias = "solved_keywords", rename = "solvedKeywords", default)]
    pub solved_keywords: Option<String>,
    #[serde(alias = "solved_count", rename = "solvedCount", default)]
    pub solved_count: Option<u32>,
    #[serde(default)]
    pub balance: Option<f64>,
}

impl TryFrom<CandidateRecord> for CandidateProfile {
    type Error = ParseEnumError;

    /// Absent fields contribute nothing; a role other than mentor is rejected.
    fn try_from(record: CandidateRecord) -> Result<Self, Self::Error> {
        if let Some(role) = record.role.as_deref() {
            if role.parse::<Role>()? != Role::Mentor {
                return Err(ParseEnumError {
                    kind: "candidate role",
                    value: role.to_string(),
                });
            }
        }
        Ok(CandidateProfile {
            id: record.id,
            categories: record
                .categories
                .as_deref()
                .map(KeywordList::parse_csv)
                .unwrap_or_default(),
            solved_keywords: record
                .solved_keywords
                .as_deref()
                .map(KeywordList::parse_csv)
                .unwrap_or_default(),
            solved_count: record.solved_count.unwrap_or(0),
            balance: record.balance.unwrap_or(0.0),
        })
    }
}

/// Request to match and price a free-text request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
    /// Absent means the configured `matching.top_k`
    #[validate(range(min = 1, max = 100))]
    #[serde(alias = "top_k", rename = "topK", default)]
    pub top_k: Option<usize>,
}

/// Request to extract keywords only
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct KeywordsRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 50))]
    #[serde(alias = "top_k", rename = "topK", default = "default_keyword_top_k")]
    pub top_k: usize,
}

fn default_keyword_top_k() -> usize {
    keywords::DEFAULT_TOP_K
}

/// Request to price a free-text request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion_skips_absent_fields() {
        let record: CandidateRecord = serde_json::from_str(r#"{"id": 3, "categories": "Math, CS"}"#).unwrap();
        let profile = CandidateProfile::try_from(record).unwrap();
        assert_eq!(profile.categories.as_slice(), &["math", "cs"]);
        assert!(profile.solved_keywords.is_empty());
    }

    #[test]
    fn test_record_conversion_rejects_students() {
        let record: CandidateRecord =
            serde_json::from_str(r#"{"id": 3, "role": "student"}"#).unwrap();
        assert!(CandidateProfile::try_from(record).is_err());
        let record: CandidateRecord =
            serde_json::from_str(r#"{"id": 3, "role": "wizard"}"#).unwrap();
        assert!(CandidateProfile::try_from(record).is_err());
    }

    #[test]
    fn test_match_request_defaults_and_validation() {
        let req: MatchRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(req.top_k, None);
        assert!(req.validate().is_ok());

        let req: MatchRequest = serde_json::from_str(r#"{"topK": 0}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
