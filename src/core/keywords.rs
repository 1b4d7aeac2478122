use crate::core::canonicalizer::Canonicalizer;
use crate::core::keyphrase::KeyphraseExtractor;
use crate::core::text::normalize_text;

/// Comma-separated input with at most this many parts is taken as an explicit keyword list
pub const MAX_EXPLICIT_PARTS: usize = 12;

/// Default number of keywords stored with a request
pub const DEFAULT_TOP_K: usize = 6;

/// Filler words that never make useful keywords
pub const KEYWORD_STOPWORDS: &[&str] = &[
    "doubt", "question", "query", "please", "help", "solve", "problem", "show", "example",
    "explain", "with", "detailed", "step", "steps", "stepby", "stepbystep", "sr", "sir", "urgent",
    "plz",
];

/// Turns free text into a short ordered list of canonical keywords.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    canonicalizer: Canonicalizer,
    keyphrases: KeyphraseExtractor,
}

impl KeywordExtractor {
    pub fn new(canonicalizer: Canonicalizer) -> Self {
        Self {
            canonicalizer,
            keyphrases: KeyphraseExtractor::default(),
        }
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// At most `top_k` unique keywords, canonical where the vocabulary has a
    /// close match and normalized raw tokens otherwise.
    pub fn extract(&self, text: &str, top_k: usize) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let candidates = self.candidates(text, top_k);

        let mut out: Vec<String> = Vec::with_capacity(top_k.min(candidates.len()));
        for candidate in candidates {
            let normalized = normalize_text(&candidate);
            if normalized.is_empty()
                || normalized.len() <= 2
                || KEYWORD_STOPWORDS.contains(&normalized.as_str())
            {
                continue;
            }

            let value = match self.canonicalizer.canonicalize(&normalized) {
                Some(m) => m.token,
                None => normalized,
            };
            if !out.contains(&value) {
                out.push(value);
            }
            if out.len() >= top_k {
                break;
            }
        }
        out
    }

    fn candidates(&self, text: &str, top_k: usize) -> Vec<String> {
        if text.contains(',') && text.split(',').count() <= MAX_EXPLICIT_PARTS {
            return text
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        let ranked: Vec<String> = self
            .keyphrases
            .extract(text)
            .into_iter()
            .take(top_k.saturating_mul(2))
            .map(|k| k.term)
            .collect();
        if ranked.is_empty() {
            tracing::debug!("No keyphrases scored, falling back to whitespace tokens");
            return text.split_whitespace().map(str::to_string).collect();
        }
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocabulary::VocabularyStore;
    use std::sync::Arc;

    fn extractor() -> KeywordExtractor {
        let vocab = VocabularyStore::new(vec![
            ("math", vec!["calculus".to_string(), "integrals".to_string()]),
            ("cs", vec!["recursion".to_string(), "sorting algorithms".to_string()]),
        ]);
        KeywordExtractor::new(Canonicalizer::new(Arc::new(vocab)))
    }

    #[test]
    fn test_blank_text() {
        assert!(extractor().extract("", 6).is_empty());
        assert!(extractor().extract("   ", 6).is_empty());
    }

    #[test]
    fn test_explicit_comma_list_is_canonicalized() {
        let out = extractor().extract("Calclus, recursoin, help, ab, Graph Theory", 6);
        assert_eq!(out, vec!["calculus", "recursion", "graph theory"]);
    }

    #[test]
    fn test_long_comma_text_uses_keyphrases() {
        let text = "a,b,c,d,e,f,g,h,i,j,k,l,m, integrals";
        let out = extractor().extract(text, 6);
        assert_eq!(out, vec!["integrals"]);
    }

    #[test]
    fn test_free_text_drops_stopwords() {
        let out = extractor().extract("Please help me solve this integral problem", 6);
        assert!(out.contains(&"integrals".to_string()));
        assert!(!out.iter().any(|k| k == "please" || k == "help" || k == "problem"));
    }

    #[test]
    fn test_respects_top_k_and_dedupes() {
        let out = extractor().extract("calculus, calculus, integrals, recursion", 2);
        assert_eq!(out, vec!["calculus", "integrals"]);
    }

    #[test]
    fn test_huge_top_k_returns_every_candidate() {
        let out = extractor().extract("calculus integrals limits", usize::MAX);
        assert!(!out.is_empty());
        assert!(out.len() <= 3);

        let out = extractor().extract("calculus, integrals, recursion", usize::MAX);
        assert_eq!(out, vec!["calculus", "integrals", "recursion"]);
    }

    #[test]
    fn test_idempotent() {
        let e = extractor();
        let text = "Sorting algorithms and recursion in graph search";
        assert_eq!(e.extract(text, 6), e.extract(text, 6));
    }
}
