//! Unsupervised single-word keyword scoring.
//!
//! Every term gets five statistical features computed from the text alone:
//!
//! - casing: how often it appears capitalized mid-sentence or as an acronym
//! - position: median index of the sentences containing it
//! - frequency: term count normalized by corpus mean + standard deviation
//! - relatedness: spread of distinct left/right neighbours
//! - spread: fraction of sentences containing it
//!
//! These combine into a score where lower is better.

use crate::core::canonicalizer::sequence_ratio;
use crate::core::text::is_stop_word;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?\n]+").expect("valid regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+(?:['-]\w+)*").expect("valid regex"));

/// Maximum keywords returned
pub const DEFAULT_TOP: usize = 12;
const DEDUP_LIMIT: f64 = 0.9;

#[derive(Debug, Default)]
struct TermStats {
    tf: usize,
    tf_upper: usize,
    tf_acronym: usize,
    sentences: Vec<usize>,
    left: HashMap<String, usize>,
    right: HashMap<String, usize>,
    first_seen: usize,
}

/// A scored candidate keyword
#[derive(Debug, Clone, PartialEq)]
pub struct Keyphrase {
    pub term: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyphraseExtractor {
    pub top: usize,
}

impl Default for KeyphraseExtractor {
    fn default() -> Self {
        Self { top: DEFAULT_TOP }
    }
}

impl KeyphraseExtractor {
    pub fn new(top: usize) -> Self {
        Self { top }
    }

    /// Ranked single-word keywords, best first, lower-cased.
    pub fn extract(&self, text: &str) -> Vec<Keyphrase> {
        let sentences: Vec<Vec<&str>> = SENTENCE_SPLIT
            .split(text)
            .map(|s| WORD.find_iter(s).map(|m| m.as_str()).collect::<Vec<_>>())
            .filter(|words| !words.is_empty())
            .collect();
        if sentences.is_empty() {
            return Vec::new();
        }

        let mut stats: HashMap<String, TermStats> = HashMap::new();
        let mut position = 0usize;
        for (sent_idx, words) in sentences.iter().enumerate() {
            for (word_idx, word) in words.iter().enumerate() {
                let term = word.to_lowercase();
                let entry = stats.entry(term).or_insert_with(|| TermStats {
                    first_seen: position,
                    ..TermStats::default()
                });
                entry.tf += 1;
                entry.sentences.push(sent_idx);
                if is_acronym(word) {
                    entry.tf_acronym += 1;
                } else if word_idx > 0 && word.chars().next().map_or(false, char::is_uppercase) {
                    entry.tf_upper += 1;
                }
                if word_idx > 0 {
                    *entry.left.entry(words[word_idx - 1].to_lowercase()).or_insert(0) += 1;
                }
                if word_idx + 1 < words.len() {
                    *entry.right.entry(words[word_idx + 1].to_lowercase()).or_insert(0) += 1;
                }
                position += 1;
            }
        }

        let valid_tfs: Vec<f64> = stats
            .iter()
            .filter(|(term, _)| !is_stop_word(term))
            .map(|(_, s)| s.tf as f64)
            .collect();
        let (mean_tf, std_tf) = mean_std(&valid_tfs);
        let max_tf = stats.values().map(|s| s.tf).max().unwrap_or(1) as f64;
        let n_sentences = sentences.len() as f64;

        let mut scored: Vec<(Keyphrase, usize)> = stats
            .iter()
            .filter(|(term, _)| is_candidate(term))
            .map(|(term, s)| {
                let tf = s.tf as f64;
                let t_case = s.tf_upper.max(s.tf_acronym) as f64 / (1.0 + tf.ln());
                let t_pos = (3.0 + median(&s.sentences)).ln().ln();
                let t_norm = if mean_tf + std_tf > 0.0 { tf / (mean_tf + std_tf) } else { 0.0 };
                let t_rel = 1.0 + (dispersion(&s.left) + dispersion(&s.right)) * (tf / max_tf);
                let distinct: HashSet<usize> = s.sentences.iter().copied().collect();
                let t_sent = distinct.len() as f64 / n_sentences;

                let h = (t_pos * t_rel) / (t_case + t_norm / t_rel + t_sent / t_rel);
                let score = h / ((1.0 + h) * tf);
                (
                    Keyphrase {
                        term: term.clone(),
                        score,
                    },
                    s.first_seen,
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            a.0.score
                .partial_cmp(&b.0.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });

        let mut out: Vec<Keyphrase> = Vec::new();
        for (kp, _) in scored {
            if out.len() >= self.top {
                break;
            }
            if out.iter().any(|k| sequence_ratio(&k.term, &kp.term) > DEDUP_LIMIT) {
                continue;
            }
            out.push(kp);
        }
        out
    }
}

fn is_candidate(term: &str) -> bool {
    term.chars().count() >= 3
        && !is_stop_word(term)
        && !term.chars().all(|c| c.is_ascii_digit())
}

fn is_acronym(word: &str) -> bool {
    word.chars().count() > 1
        && word.chars().any(char::is_alphabetic)
        && word.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase)
}

/// Distinct neighbours over total co-occurrences.
fn dispersion(neighbours: &HashMap<String, usize>) -> f64 {
    let total: usize = neighbours.values().sum();
    if total == 0 {
        return 0.0;
    }
    neighbours.len() as f64 / total as f64
}

fn median(values: &[usize]) -> f64 {
    let mut v = values.to_vec();
    v.sort_unstable();
    let n = v.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => v[n / 2] as f64,
        _ => (v[n / 2 - 1] + v[n / 2]) as f64 / 2.0,
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(text: &str) -> Vec<String> {
        KeyphraseExtractor::default()
            .extract(text)
            .into_iter()
            .map(|k| k.term)
            .collect()
    }

    #[test]
    fn test_empty_text() {
        assert!(terms("").is_empty());
        assert!(terms("  . ! ").is_empty());
    }

    #[test]
    fn test_excludes_stop_words_short_and_numeric() {
        let out = terms("How do I solve the integral of x from 0 to 10 in 2024?");
        assert!(out.contains(&"integral".to_string()));
        for t in &out {
            assert!(!is_stop_word(t));
            assert!(t.chars().count() >= 3);
            assert!(!t.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_output_is_lowercase_and_unique() {
        let out = terms("Calculus. calculus integrals. Integrals and CALCULUS limits.");
        let unique: HashSet<&String> = out.iter().collect();
        assert_eq!(unique.len(), out.len());
        assert!(out.iter().all(|t| t == &t.to_lowercase()));
    }

    #[test]
    fn test_respects_top() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima mike november";
        let out = KeyphraseExtractor::new(5).extract(text);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_near_duplicates_removed() {
        let out = terms("integral integrals derivative");
        assert!(!(out.contains(&"integral".to_string()) && out.contains(&"integrals".to_string())));
    }

    #[test]
    fn test_scores_sorted_ascending() {
        let out = KeyphraseExtractor::default()
            .extract("Graph algorithms use dynamic programming. Graph traversal uses recursion.");
        for pair in out.windows(2) {
            assert!(pair[0].score <= pair[1].score);
        }
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3, 1, 2]), 2.0);
        assert_eq!(median(&[0, 1]), 0.5);
    }
}
