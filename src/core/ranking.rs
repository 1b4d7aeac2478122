use crate::core::text::round_to;
use crate::models::{CandidateProfile, ScoredCandidate, ScoringWeights};

/// Default number of ranked candidates returned
pub const DEFAULT_TOP_K: usize = 5;

/// Turn blended similarities into boosted 0-100 scores, best first.
///
/// `similarities[i]` belongs to `candidates[i]`. Equal scores keep the
/// candidates' input order.
pub fn rank(
    similarities: &[f64],
    category: &str,
    keywords: &[String],
    candidates: &[CandidateProfile],
    top_k: usize,
    weights: &ScoringWeights,
) -> Vec<ScoredCandidate> {
    let category = category.trim().to_lowercase();

    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let similarity = similarities.get(idx).copied().unwrap_or(0.0);
            let similarity = if similarity.is_finite() { similarity } else { 0.0 };
            let mut score = round_to(similarity * 100.0, 4);

            if !category.is_empty() && candidate.categories.contains(&category) {
                score += weights.category_boost;
            }

            let profile = candidate.profile_text().to_lowercase();
            let hits = keywords
                .iter()
                .filter(|kw| !kw.is_empty() && profile.contains(kw.to_lowercase().as_str()))
                .count();
            score += weights.keyword_boost * hits as f64;

            ScoredCandidate {
                candidate_id: candidate.id,
                score: round_to(score.clamp(0.0, 100.0), 4),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    scored
}

/// Candidate ids in claim order: ranked ids first, then every candidate whose
/// category list mentions `category`, or all candidates if both are empty.
pub fn matched_candidate_ids(
    ranked: &[ScoredCandidate],
    category: &str,
    candidates: &[CandidateProfile],
) -> Vec<i64> {
    let category = category.trim().to_lowercase();
    let mut ids: Vec<i64> = Vec::with_capacity(ranked.len());
    for m in ranked {
        if !ids.contains(&m.candidate_id) {
            ids.push(m.candidate_id);
        }
    }
    for candidate in candidates {
        let mentions = candidate.categories.iter().any(|c| c.contains(category.as_str()));
        if mentions && !ids.contains(&candidate.id) {
            ids.push(candidate.id);
        }
    }
    if ids.is_empty() {
        ids = candidates.iter().map(|c| c.id).collect();
    }
    ids
}

/// Fraction of `keywords` present in the candidate's categories or history.
pub fn overlap_score(candidate: &CandidateProfile, keywords: &[String]) -> f64 {
    let known: Vec<&str> = candidate
        .solved_keywords
        .iter()
        .chain(candidate.categories.iter())
        .collect();
    if known.is_empty() || keywords.is_empty() {
        return 0.0;
    }
    let overlap = keywords
        .iter()
        .filter(|k| known.contains(&k.to_lowercase().as_str()))
        .count();
    round_to(overlap as f64 / keywords.len() as f64, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_empty_candidates() {
        let out = rank(&[], "math", &kw(&["calculus"]), &[], 5, &ScoringWeights::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_category_boost_is_exact_token_match() {
        let candidates = vec![
            CandidateProfile::new(1, "math,physics", ""),
            CandidateProfile::new(2, "mathematics", ""),
        ];
        let out = rank(&[0.0, 0.0], "Math", &[], &candidates, 5, &ScoringWeights::default());
        assert_eq!(out[0], ScoredCandidate { candidate_id: 1, score: 12.0 });
        assert_eq!(out[1], ScoredCandidate { candidate_id: 2, score: 0.0 });
    }

    #[test]
    fn test_keyword_boost_is_substring_and_uncapped() {
        let candidates = vec![CandidateProfile::new(1, "cs", "recursion,graphs,dp")];
        let out = rank(
            &[0.1],
            "",
            &kw(&["recursion", "graph", "dp", "optics"]),
            &candidates,
            5,
            &ScoringWeights::default(),
        );
        assert_eq!(out[0].score, 10.0 + 18.0);
    }

    #[test]
    fn test_score_clamped_to_100() {
        let candidates = vec![CandidateProfile::new(1, "math", "calculus,integrals,limits")];
        let out = rank(
            &[0.95],
            "math",
            &kw(&["calculus", "integrals", "limits"]),
            &candidates,
            5,
            &ScoringWeights::default(),
        );
        assert_eq!(out[0].score, 100.0);
    }

    #[test]
    fn test_sorted_truncated_and_stable() {
        let candidates: Vec<CandidateProfile> =
            (1..=6).map(|i| CandidateProfile::new(i, "", "")).collect();
        let sims = [0.2, 0.5, 0.5, 0.1, 0.9, 0.5];
        let out = rank(&sims, "", &[], &candidates, 4, &ScoringWeights::default());
        let ids: Vec<i64> = out.iter().map(|m| m.candidate_id).collect();
        assert_eq!(ids, vec![5, 2, 3, 6]);
    }

    #[test]
    fn test_missing_similarity_treated_as_zero() {
        let candidates = vec![CandidateProfile::new(1, "", ""), CandidateProfile::new(2, "", "")];
        let out = rank(&[0.5], "", &[], &candidates, 5, &ScoringWeights::default());
        assert_eq!(out[1], ScoredCandidate { candidate_id: 2, score: 0.0 });
    }

    #[test]
    fn test_matched_ids_appends_category_mentors() {
        let candidates = vec![
            CandidateProfile::new(1, "physics", ""),
            CandidateProfile::new(2, "applied math", ""),
            CandidateProfile::new(3, "math", ""),
        ];
        let ranked = vec![ScoredCandidate { candidate_id: 3, score: 40.0 }];
        assert_eq!(matched_candidate_ids(&ranked, "math", &candidates), vec![3, 2]);
    }

    #[test]
    fn test_matched_ids_falls_back_to_all() {
        let candidates = vec![CandidateProfile::new(1, "physics", ""), CandidateProfile::new(2, "cs", "")];
        assert_eq!(matched_candidate_ids(&[], "biology", &candidates), vec![1, 2]);
    }

    #[test]
    fn test_overlap_score() {
        let c = CandidateProfile::new(1, "math", "calculus,limits");
        assert_eq!(overlap_score(&c, &kw(&["calculus", "optics", "math"])), 0.6667);
        assert_eq!(overlap_score(&c, &[]), 0.0);
        assert_eq!(overlap_score(&CandidateProfile::new(2, "", ""), &kw(&["math"])), 0.0);
    }
}
