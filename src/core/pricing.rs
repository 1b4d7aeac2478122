use crate::core::artifact::{self, ArtifactError};
use crate::core::similarity::{Analyzer, TfidfVectorizer, VectorizerState};
use crate::core::text::{round_to, word_count};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Lowest price ever quoted
pub const MIN_PRICE: f64 = 10.0;
/// Demand factor fed to the regressor at serving time
pub const DEMAND_FACTOR: f64 = 1.5;
/// Number of structured features
pub const FEATURES: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("No training samples")]
    NoSamples,

    #[error("Singular feature matrix; samples do not determine a unique fit")]
    Singular,
}

/// One tree of a regression forest, stored as a flat node array rooted at 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl RegressionTree {
    /// `None` if the tree is malformed (dangling child or cycle).
    fn predict(&self, x: &[f64; FEATURES]) -> Option<f64> {
        let mut idx = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx)? {
                TreeNode::Leaf { value } => return Some(*value),
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if *x.get(*feature)? <= *threshold { *left } else { *right };
                }
            }
        }
        None
    }
}

/// Fitted regressor over `[word count, complexity, demand, category code]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        intercept: f64,
        weights: [f64; FEATURES],
    },
    Forest {
        trees: Vec<RegressionTree>,
    },
}

impl Regressor {
    pub fn predict(&self, x: &[f64; FEATURES]) -> Option<f64> {
        match self {
            Regressor::Linear { intercept, weights } => {
                Some(intercept + weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>())
            }
            Regressor::Forest { trees } => {
                if trees.is_empty() {
                    return None;
                }
                let mut sum = 0.0;
                for tree in trees {
                    sum += tree.predict(x)?;
                }
                Some(sum / trees.len() as f64)
            }
        }
    }
}

/// Training row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSample {
    pub text: String,
    pub category: String,
    pub length: f64,
    pub complexity: f64,
    pub demand: f64,
    pub price: f64,
}

/// Offline-built bundle: vectorizer state, regressor and category encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceModel {
    #[serde(default)]
    pub vectorizer: Option<VectorizerState>,
    pub regressor: Regressor,
    #[serde(rename = "category_map", default)]
    pub category_map: BTreeMap<String, usize>,
}

impl PriceModel {
    /// Ordinary least squares over the four structured features.
    pub fn fit(samples: &[PriceSample]) -> Result<Self, PricingError> {
        if samples.is_empty() {
            return Err(PricingError::NoSamples);
        }

        let category_map: BTreeMap<String, usize> = samples
            .iter()
            .map(|s| s.category.trim().to_lowercase())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, c)| (c, i))
            .collect();

        // Normal equations (X^T X) b = X^T y with a leading intercept column.
        const N: usize = FEATURES + 1;
        let mut xtx = [[0.0f64; N]; N];
        let mut xty = [0.0f64; N];
        for s in samples {
            let code = category_map[&s.category.trim().to_lowercase()] as f64;
            let row = [1.0, s.length, s.complexity, s.demand, code];
            for i in 0..N {
                xty[i] += row[i] * s.price;
                for j in 0..N {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        let beta = solve(xtx, xty).ok_or(PricingError::Singular)?;

        let texts: Vec<&str> = samples.iter().map(|s| s.text.as_str()).collect();
        let vectorizer = TfidfVectorizer::new(
            Analyzer::Word {
                min_n: 1,
                max_n: 2,
                stop_words: false,
            },
            None,
        )
        .fit_transform(texts.as_slice())
        .ok()
        .map(|f| f.state);

        Ok(Self {
            vectorizer,
            regressor: Regressor::Linear {
                intercept: beta[0],
                weights: [beta[1], beta[2], beta[3], beta[4]],
            },
            category_map,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        artifact::write_json(path, self)
    }

    fn features(&self, text: Option<&str>, category: Option<&str>) -> [f64; FEATURES] {
        let length = word_count(text) as f64;
        let category = category.unwrap_or("").trim().to_lowercase();
        let code = self.category_map.get(&category).copied().unwrap_or(0) as f64;
        [length, length / 5.0, DEMAND_FACTOR, code]
    }
}

/// Gaussian elimination with partial pivoting.
fn solve<const N: usize>(mut a: [[f64; N]; N], mut b: [f64; N]) -> Option<[f64; N]> {
    for col in 0..N {
        let pivot = (col..N).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-9 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..N {
            let factor = a[row][col] / a[col][col];
            for k in col..N {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = [0.0; N];
    for row in (0..N).rev() {
        let tail: f64 = (row + 1..N).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Quotes a price for a request, from a trained model when one is available.
#[derive(Debug, Clone, Default)]
pub struct PriceEstimator {
    model: Option<Arc<PriceModel>>,
}

impl PriceEstimator {
    pub fn new(model: Option<PriceModel>) -> Self {
        Self {
            model: model.map(Arc::new),
        }
    }

    pub fn heuristic() -> Self {
        Self::default()
    }

    /// Load the model bundle; a missing file falls back to the heuristic.
    pub fn load_or_fallback(path: &Path) -> Result<Self, ArtifactError> {
        match artifact::read_json::<PriceModel>(path)? {
            Some(model) => {
                tracing::info!("Loaded price model from {}", path.display());
                Ok(Self::new(Some(model)))
            }
            None => {
                tracing::warn!("Price model {} not found, using heuristic pricing", path.display());
                Ok(Self::heuristic())
            }
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Price >= 10, rounded to 2 decimals. Never fails.
    pub fn estimate(&self, text: Option<&str>, category: Option<&str>) -> f64 {
        let Some(model) = &self.model else {
            return heuristic_price(text);
        };
        let x = model.features(text, category);
        match model.regressor.predict(&x) {
            Some(price) if price.is_finite() => round_to(price, 2).max(MIN_PRICE),
            _ => {
                tracing::debug!("Price model produced no usable prediction, using heuristic");
                heuristic_price(text)
            }
        }
    }
}

/// `max(10, 20 + 2 * words)`
pub fn heuristic_price(text: Option<&str>) -> f64 {
    let words = word_count(text) as f64;
    round_to(20.0 + words * 2.0, 2).max(MIN_PRICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(intercept: f64, weights: [f64; FEATURES]) -> PriceModel {
        let mut category_map = BTreeMap::new();
        category_map.insert("cs".to_string(), 0);
        category_map.insert("math".to_string(), 1);
        PriceModel {
            vectorizer: None,
            regressor: Regressor::Linear { intercept, weights },
            category_map,
        }
    }

    #[test]
    fn test_heuristic() {
        assert_eq!(heuristic_price(None), 20.0);
        assert_eq!(heuristic_price(Some("")), 20.0);
        assert_eq!(heuristic_price(Some("two words")), 24.0);
        assert_eq!(PriceEstimator::heuristic().estimate(Some("a b c"), Some("math")), 26.0);
    }

    #[test]
    fn test_model_features_and_rounding() {
        let est = PriceEstimator::new(Some(linear(1.0, [2.0, 10.0, 4.0, 100.0])));
        // 5 words: 1 + 2*5 + 10*1 + 4*1.5 + 100*1
        assert_eq!(est.estimate(Some("one two three four five"), Some("MATH")), 127.0);
        // unseen category encodes as 0
        assert_eq!(est.estimate(Some("one two three four five"), Some("art")), 27.0);
    }

    #[test]
    fn test_model_clamped_to_minimum() {
        let est = PriceEstimator::new(Some(linear(-500.0, [0.0; FEATURES])));
        assert_eq!(est.estimate(None, None), MIN_PRICE);
    }

    #[test]
    fn test_non_finite_prediction_falls_back() {
        let est = PriceEstimator::new(Some(linear(f64::NAN, [0.0; FEATURES])));
        assert_eq!(est.estimate(Some("x y"), None), 24.0);
    }

    #[test]
    fn test_forest_prediction() {
        let tree = |lo: f64, hi: f64| RegressionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 3.0, left: 1, right: 2 },
                TreeNode::Leaf { value: lo },
                TreeNode::Leaf { value: hi },
            ],
        };
        let r = Regressor::Forest { trees: vec![tree(10.0, 50.0), tree(20.0, 70.0)] };
        assert_eq!(r.predict(&[2.0, 0.0, 0.0, 0.0]), Some(15.0));
        assert_eq!(r.predict(&[8.0, 0.0, 0.0, 0.0]), Some(60.0));
    }

    #[test]
    fn test_malformed_forest_is_none() {
        let r = Regressor::Forest {
            trees: vec![RegressionTree {
                nodes: vec![TreeNode::Split { feature: 0, threshold: 1.0, left: 0, right: 0 }],
            }],
        };
        assert_eq!(r.predict(&[0.0; FEATURES]), None);
        assert_eq!(Regressor::Forest { trees: vec![] }.predict(&[0.0; FEATURES]), None);
    }

    #[test]
    fn test_fit_recovers_linear_rule() {
        let categories = ["math", "physics", "cs"];
        let samples: Vec<PriceSample> = (0..30)
            .map(|i| {
                let length = (5 + i % 7) as f64;
                let complexity = 0.5 + (i % 5) as f64 * 0.4;
                let demand = 0.5 + (i % 3) as f64 * 0.5;
                let category = categories[i % 3];
                let code = match category {
                    "cs" => 0.0,
                    "math" => 1.0,
                    _ => 2.0,
                };
                PriceSample {
                    text: format!("{} topic {}", category, i),
                    category: category.to_string(),
                    length,
                    complexity,
                    demand,
                    price: 20.0 + complexity * 50.0 + length * 2.0 + demand * 20.0 + code * 3.0,
                }
            })
            .collect();

        let model = PriceModel::fit(&samples).unwrap();
        assert_eq!(model.category_map["cs"], 0);
        assert_eq!(model.category_map["physics"], 2);
        match &model.regressor {
            Regressor::Linear { intercept, weights } => {
                assert!((intercept - 20.0).abs() < 1e-6);
                assert!((weights[0] - 2.0).abs() < 1e-6);
                assert!((weights[1] - 50.0).abs() < 1e-6);
                assert!((weights[2] - 20.0).abs() < 1e-6);
                assert!((weights[3] - 3.0).abs() < 1e-6);
            }
            other => panic!("unexpected regressor {:?}", other),
        }
        assert!(model.vectorizer.is_some());
    }

    #[test]
    fn test_fit_errors() {
        assert_eq!(PriceModel::fit(&[]).unwrap_err(), PricingError::NoSamples);
        let same = PriceSample {
            text: "x".to_string(),
            category: "math".to_string(),
            length: 1.0,
            complexity: 1.0,
            demand: 1.0,
            price: 30.0,
        };
        assert_eq!(PriceModel::fit(&[same.clone(), same]).unwrap_err(), PricingError::Singular);
    }

    #[test]
    fn test_load_or_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        assert!(!PriceEstimator::load_or_fallback(&path).unwrap().has_model());

        linear(0.0, [1.0, 0.0, 0.0, 0.0]).save(&path).unwrap();
        let est = PriceEstimator::load_or_fallback(&path).unwrap();
        assert!(est.has_model());
        assert_eq!(est.estimate(Some("a b c d e f g h i j k l"), None), 12.0);

        std::fs::write(&path, b"[1, 2").unwrap();
        assert!(PriceEstimator::load_or_fallback(&path).is_err());
    }
}
