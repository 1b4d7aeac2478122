use crate::core::text::is_stop_word;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

static WORD_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("empty vocabulary: documents contain only stop words or no tokens")]
    EmptyVocabulary,
}

/// How a document is split into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Analyzer {
    /// Word n-grams over tokens of two or more word characters.
    Word {
        min_n: usize,
        max_n: usize,
        stop_words: bool,
    },
    /// Character n-grams taken inside each word, padded with one space on each side.
    CharWordBounded { min_n: usize, max_n: usize },
}

impl Analyzer {
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let doc = doc.to_lowercase();
        match *self {
            Analyzer::Word { min_n, max_n, stop_words } => {
                let tokens: Vec<&str> = WORD_TOKEN
                    .find_iter(&doc)
                    .map(|m| m.as_str())
                    .filter(|t| !stop_words || !is_stop_word(t))
                    .collect();
                word_ngrams(&tokens, min_n, max_n)
            }
            Analyzer::CharWordBounded { min_n, max_n } => char_wb_ngrams(&doc, min_n, max_n),
        }
    }
}

fn word_ngrams(tokens: &[&str], min_n: usize, max_n: usize) -> Vec<String> {
    let mut out = Vec::new();
    for n in min_n.max(1)..=max_n {
        if n > tokens.len() {
            break;
        }
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    out
}

fn char_wb_ngrams(doc: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let mut out = Vec::new();
    for word in doc.split_whitespace() {
        let padded: Vec<char> = format!(" {} ", word).chars().collect();
        let len = padded.len();
        for n in min_n.max(1)..=max_n {
            if len <= n {
                // Short words contribute themselves once.
                out.push(padded.iter().collect());
                break;
            }
            out.extend(padded.windows(n).map(|w| w.iter().collect::<String>()));
        }
    }
    out
}

/// Sparse row as `(feature index, weight)` pairs sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Fitted vocabulary and idf weights; serializable as part of artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerState {
    pub analyzer: Analyzer,
    pub vocabulary: BTreeMap<String, usize>,
    pub idf: Vec<f64>,
}

impl VectorizerState {
    /// Feature names ordered by index.
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            names[idx] = term.as_str();
        }
        names
    }
}

#[derive(Debug, Clone)]
pub struct FittedTfidf {
    pub state: VectorizerState,
    pub rows: Vec<SparseVector>,
}

/// Smoothed-idf TF-IDF vectorizer with l2-normalized rows.
#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    pub analyzer: Analyzer,
    pub max_features: Option<usize>,
}

impl TfidfVectorizer {
    pub fn new(analyzer: Analyzer, max_features: Option<usize>) -> Self {
        Self { analyzer, max_features }
    }

    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> Result<FittedTfidf, SimilarityError> {
        let doc_counts: Vec<HashMap<String, usize>> = docs
            .iter()
            .map(|d| {
                let mut counts = HashMap::new();
                for term in self.analyzer.analyze(d.as_ref()) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
        for counts in &doc_counts {
            for (term, &c) in counts {
                let entry = totals.entry(term.as_str()).or_insert((0, 0));
                entry.0 += c;
                entry.1 += 1;
            }
        }

        if totals.is_empty() {
            return Err(SimilarityError::EmptyVocabulary);
        }

        let mut kept: Vec<(&str, usize, usize)> =
            totals.into_iter().map(|(t, (tf, df))| (t, tf, df)).collect();
        if let Some(limit) = self.max_features {
            if kept.len() > limit {
                kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                kept.truncate(limit);
            }
        }
        kept.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = docs.len() as f64;
        let vocabulary: BTreeMap<String, usize> = kept
            .iter()
            .enumerate()
            .map(|(i, (t, _, _))| (t.to_string(), i))
            .collect();
        let idf: Vec<f64> = kept
            .iter()
            .map(|(_, _, df)| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let rows = doc_counts
            .iter()
            .map(|counts| {
                let mut row: SparseVector = counts
                    .iter()
                    .filter_map(|(term, &c)| vocabulary.get(term).map(|&i| (i, c as f64 * idf[i])))
                    .collect();
                row.sort_by_key(|&(i, _)| i);
                l2_normalize(&mut row);
                row
            })
            .collect();

        Ok(FittedTfidf {
            state: VectorizerState {
                analyzer: self.analyzer,
                vocabulary,
                idf,
            },
            rows,
        })
    }
}

fn l2_normalize(row: &mut SparseVector) {
    let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, v) in row.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity between two sparse vectors; zero vectors give 0.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j, mut dot) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    let na = a.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
    let nb = b.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

/// Blend weights and feature caps for the two representations.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityWeights {
    pub word: f64,
    pub char: f64,
    pub max_features: usize,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            word: 0.75,
            char: 0.25,
            max_features: 5000,
        }
    }
}

/// Dual-representation similarity between one query and a pool of profiles.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    word: TfidfVectorizer,
    char: TfidfVectorizer,
    weights: SimilarityWeights,
}

impl SimilarityEngine {
    pub fn new(weights: SimilarityWeights) -> Self {
        Self {
            word: TfidfVectorizer::new(
                Analyzer::Word { min_n: 1, max_n: 2, stop_words: true },
                Some(weights.max_features),
            ),
            char: TfidfVectorizer::new(
                Analyzer::CharWordBounded { min_n: 3, max_n: 5 },
                Some(weights.max_features),
            ),
            weights,
        }
    }

    /// Blended similarity in [0, 1] of `query` against each profile text.
    pub fn score(&self, query: &str, profiles: &[String]) -> Vec<f64> {
        if profiles.is_empty() {
            return Vec::new();
        }
        let word = similarities(&self.word, query, profiles);
        let char = similarities(&self.char, query, profiles);
        word.iter()
            .zip(char.iter())
            .map(|(w, c)| (self.weights.word * w + self.weights.char * c).clamp(0.0, 1.0))
            .collect()
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(SimilarityWeights::default())
    }
}

fn similarities(vectorizer: &TfidfVectorizer, query: &str, profiles: &[String]) -> Vec<f64> {
    let mut corpus: Vec<&str> = Vec::with_capacity(profiles.len() + 1);
    corpus.push(query);
    corpus.extend(profiles.iter().map(String::as_str));

    match vectorizer.fit_transform(corpus.as_slice()) {
        Ok(fitted) => {
            let (q, rest) = fitted.rows.split_at(1);
            rest.iter().map(|row| cosine_similarity(&q[0], row)).collect()
        }
        Err(e) => {
            tracing::debug!("Similarity space degenerate ({:?}): {}", vectorizer.analyzer, e);
            vec![0.0; profiles.len()]
        }
    }
}
