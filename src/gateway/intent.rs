//! Free-text intent classification.
//!
//! TF-IDF features (smoothed idf, L2-normalized rows) fed to a multinomial
//! logistic regression fitted by full-batch gradient descent. Training is
//! deterministic and happens once at startup.

use super::intent_data::TRAINING_EXAMPLES;
use kora_core::{config::IntentConfig, error::KoraError};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

pub const GENERATE_IMAGE: &str = "generate_image";

const ITERATIONS: usize = 500;
const LEARNING_RATE: f64 = 1.0;

type SparseRow = Vec<(usize, f64)>;

/// Trained intent classifier. Read-only after construction.
pub struct IntentClassifier {
    vocab: HashMap<String, usize>,
    idf: Vec<f64>,
    labels: Vec<String>,
    /// `weights[label][feature]`.
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl IntentClassifier {
    /// Fit on the built-in examples plus any configured extras.
    pub fn from_config(config: &IntentConfig) -> Result<Self, KoraError> {
        let mut examples: Vec<(String, String)> = TRAINING_EXAMPLES
            .iter()
            .map(|(text, label)| (text.to_string(), label.to_string()))
            .collect();
        examples.extend(
            config
                .extra_examples
                .iter()
                .map(|e| (e.text.clone(), e.label.clone())),
        );
        Self::train(&examples)
    }

    pub fn train(examples: &[(String, String)]) -> Result<Self, KoraError> {
        if examples.is_empty() {
            return Err(KoraError::Config(
                "intent classifier needs training examples".into(),
            ));
        }

        let labels: Vec<String> = examples
            .iter()
            .map(|(_, l)| l.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let docs: Vec<Vec<String>> = examples.iter().map(|(t, _)| tokenize(t)).collect();

        let vocab: HashMap<String, usize> = docs
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term, i))
            .collect();

        let n = examples.len() as f64;
        let mut df = vec![0usize; vocab.len()];
        for doc in &docs {
            let unique: BTreeSet<usize> = doc.iter().filter_map(|t| vocab.get(t).copied()).collect();
            for idx in unique {
                df[idx] += 1;
            }
        }
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut classifier = Self {
            vocab,
            idf,
            weights: vec![vec![0.0; df.len()]; labels.len()],
            bias: vec![0.0; labels.len()],
            labels,
        };

        let rows: Vec<SparseRow> = docs.iter().map(|d| classifier.vectorize(d)).collect();
        let targets: Vec<usize> = examples
            .iter()
            .filter_map(|(_, l)| classifier.labels.iter().position(|x| x == l))
            .collect();
        classifier.fit(&rows, &targets);

        info!(
            "intent classifier trained: {} examples, {} labels, {} terms",
            examples.len(),
            classifier.labels.len(),
            classifier.vocab.len()
        );
        Ok(classifier)
    }

    /// Most likely label for `text`.
    pub fn classify(&self, text: &str) -> &str {
        let row = self.vectorize(&tokenize(text));
        let probs = self.probabilities(&row);
        let best = probs
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (i, &p)| if p > acc.1 { (i, p) } else { acc })
            .0;
        &self.labels[best]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn vectorize(&self, tokens: &[String]) -> SparseRow {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocab.get(token) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }
        let mut row: SparseRow = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        row.sort_by_key(|(idx, _)| *idx);

        let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut row {
                *v /= norm;
            }
        }
        row
    }

    fn probabilities(&self, row: &SparseRow) -> Vec<f64> {
        let scores: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| b + row.iter().map(|(idx, v)| w[*idx] * v).sum::<f64>())
            .collect();
        softmax(&scores)
    }

    /// Minimize mean cross-entropy plus `lambda / 2 * |W|^2`.
    fn fit(&mut self, rows: &[SparseRow], targets: &[usize]) {
        let n = rows.len() as f64;
        let k = self.labels.len();
        let d = self.idf.len();
        let lambda = 1.0 / n;

        for _ in 0..ITERATIONS {
            let mut grad_w = vec![vec![0.0; d]; k];
            let mut grad_b = vec![0.0; k];

            for (row, &target) in rows.iter().zip(targets) {
                let probs = self.probabilities(row);
                for (c, p) in probs.iter().enumerate() {
                    let err = p - if c == target { 1.0 } else { 0.0 };
                    grad_b[c] += err;
                    for (idx, v) in row {
                        grad_w[c][*idx] += err * v;
                    }
                }
            }

            for c in 0..k {
                for j in 0..d {
                    let g = grad_w[c][j] / n + lambda * self.weights[c][j];
                    self.weights[c][j] -= LEARNING_RATE * g;
                }
                self.bias[c] -= LEARNING_RATE * grad_b[c] / n;
            }
        }
    }
}

/// Lowercased runs of word characters, at least two long.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::MIN, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
