use crate::core::text::normalize_text;
use crate::core::vocabulary::VocabularyStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Default minimum similarity for a fuzzy match
pub const DEFAULT_CUTOFF: f64 = 0.62;

/// A token mapped onto a category's vocabulary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalMatch {
    pub category: String,
    pub token: String,
    pub similarity: f64,
}

/// Ratcliff/Obershelp similarity: `2 * M / (|a| + |b|)` where `M` is the
/// total length of the recursively found longest matching blocks.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_match(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Longest common block; the earliest block in `a`, then in `b`, wins ties.
fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut cur = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                let k = prev[j] + 1;
                cur[j + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

/// Upper bound on [`sequence_ratio`] from shared character counts.
pub fn quick_ratio(a: &str, b: &str) -> f64 {
    let mut avail: HashMap<char, isize> = HashMap::new();
    for c in b.chars() {
        *avail.entry(c).or_insert(0) += 1;
    }
    let mut matches = 0usize;
    let mut len_a = 0usize;
    for c in a.chars() {
        len_a += 1;
        if let Some(n) = avail.get_mut(&c) {
            if *n > 0 {
                matches += 1;
            }
            *n -= 1;
        }
    }
    let total = len_a + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    2.0 * matches as f64 / total as f64
}

/// Maps arbitrary tokens to the closest canonical vocabulary token.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    vocabulary: Arc<VocabularyStore>,
    cutoff: f64,
}

impl Canonicalizer {
    pub fn new(vocabulary: Arc<VocabularyStore>) -> Self {
        Self::with_cutoff(vocabulary, DEFAULT_CUTOFF)
    }

    pub fn with_cutoff(vocabulary: Arc<VocabularyStore>, cutoff: f64) -> Self {
        Self { vocabulary, cutoff }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Map with the configured cutoff.
    pub fn canonicalize(&self, token: &str) -> Option<CanonicalMatch> {
        self.map(token, self.cutoff)
    }

    /// Best match across all categories at or above `cutoff`.
    ///
    /// Within a category the earlier (higher ranked) token wins ties; across
    /// categories the lexicographically first category wins.
    pub fn map(&self, token: &str, cutoff: f64) -> Option<CanonicalMatch> {
        let token = normalize_text(token);
        if token.is_empty() {
            return None;
        }

        let mut best: Option<(&str, &str, f64)> = None;
        for (category, tokens) in self.vocabulary.iter() {
            for candidate in tokens {
                if quick_ratio(&token, candidate) < cutoff {
                    continue;
                }
                let ratio = sequence_ratio(&token, candidate);
                if ratio < cutoff {
                    continue;
                }
                if best.map_or(true, |(_, _, r)| ratio > r) {
                    best = Some((category, candidate.as_str(), ratio));
                }
            }
        }

        best.map(|(category, token, similarity)| CanonicalMatch {
            category: category.to_string(),
            token: token.to_string(),
            similarity,
        })
    }
}
