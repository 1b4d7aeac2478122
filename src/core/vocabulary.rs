use crate::core::artifact::{self, ArtifactError};
use crate::core::similarity::{Analyzer, TfidfVectorizer};
use crate::core::text::normalize_text;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Maximum canonical tokens kept per category
pub const DEFAULT_TOKEN_CAP: usize = 400;
const TFIDF_MAX_FEATURES: usize = 2000;
const FREQUENCY_TOP: usize = 200;

/// One labeled document of the offline corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledText {
    pub text: String,
    pub category: String,
}

/// Category label -> ranked canonical tokens.
///
/// Categories are lower-cased and iterated in lexicographic order; tokens
/// within a category are unique and keep their relevance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VocabularyStore {
    categories: BTreeMap<String, Vec<String>>,
}

impl VocabularyStore {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: AsRef<str>,
    {
        let mut categories: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (category, tokens) in entries {
            let key = category.as_ref().trim().to_lowercase();
            let list = categories.entry(key).or_default();
            for token in tokens {
                if !list.contains(&token) {
                    list.push(token);
                }
            }
        }
        Self { categories }
    }

    /// Load the vocabulary file; a missing file yields an empty store.
    pub fn load_or_empty(path: &Path) -> Result<Self, ArtifactError> {
        match artifact::read_json::<BTreeMap<String, Vec<String>>>(path)? {
            Some(raw) => {
                let store = Self::new(raw);
                tracing::info!(
                    "Loaded vocabulary from {} ({} categories)",
                    path.display(),
                    store.len()
                );
                Ok(store)
            }
            None => {
                tracing::warn!("Vocabulary file {} not found, canonicalization disabled", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        artifact::write_json(path, self)
    }

    pub fn tokens(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories.iter().map(|(c, t)| (c.as_str(), t.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Builds a [`VocabularyStore`] from a labeled corpus.
#[derive(Debug, Clone, Copy)]
pub struct VocabularyBuilder {
    pub token_cap: usize,
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self {
            token_cap: DEFAULT_TOKEN_CAP,
        }
    }
}

impl VocabularyBuilder {
    pub fn build(&self, corpus: &[LabeledText]) -> VocabularyStore {
        let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for doc in corpus {
            let category = doc.category.trim().to_lowercase();
            if category.is_empty() {
                continue;
            }
            by_category
                .entry(category)
                .or_default()
                .push(normalize_text(&doc.text));
        }

        let entries = by_category.into_iter().map(|(category, texts)| {
            let tokens = self.top_tokens(&texts);
            tracing::info!("Built vocabulary for {}: {} tokens", category, tokens.len());
            (category, tokens)
        });
        VocabularyStore::new(entries.collect::<Vec<_>>())
    }

    /// Ranked tokens for one category's normalized texts.
    pub fn top_tokens(&self, texts: &[String]) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        let ranked = tfidf_ranked(texts);
        let frequent = frequency_ranked(texts);

        let mut out: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for token in ranked.into_iter().take(self.token_cap).chain(frequent) {
            if out.len() >= self.token_cap {
                break;
            }
            if seen.insert(token.clone()) {
                out.push(token);
            }
        }
        out
    }
}

/// 1-2-gram features ordered by summed tf-idf weight (ties lexicographic).
fn tfidf_ranked(texts: &[String]) -> Vec<String> {
    let vectorizer = TfidfVectorizer::new(
        Analyzer::Word {
            min_n: 1,
            max_n: 2,
            stop_words: true,
        },
        Some(TFIDF_MAX_FEATURES),
    );
    let fitted = match vectorizer.fit_transform(texts) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };

    let mut sums = vec![0.0f64; fitted.state.idf.len()];
    for row in &fitted.rows {
        for &(idx, w) in row {
            sums[idx] += w;
        }
    }

    let names = fitted.state.feature_names();
    let mut pairs: Vec<(&str, f64)> = names.into_iter().zip(sums).collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    pairs.into_iter().map(|(t, _)| t.to_string()).collect()
}

/// Single tokens longer than two characters by count (ties by first appearance).
fn frequency_ranked(texts: &[String]) -> Vec<String> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for text in texts {
        for word in text.split_whitespace().filter(|w| w.len() > 2) {
            match index.get(word) {
                Some(&i) => order[i].1 += 1,
                None => {
                    index.insert(word, order.len());
                    order.push((word, 1));
                }
            }
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(FREQUENCY_TOP)
        .map(|(w, _)| w.to_string())
        .collect()
}
