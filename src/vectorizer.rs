//! TF-IDF features for the topic model.
//!
//! Terms are runs of two or more word characters in the lowercased
//! document. The vocabulary keeps the `max_features` terms with the highest
//! corpus frequency and is then ordered alphabetically. Weights use raw term
//! counts and the smoothed idf `ln((1 + n) / (1 + df)) + 1`; each row is
//! scaled to unit L2 norm.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use counter::Counter;
use ndarray::Array2;
use regex::Regex;
use tracing::debug;

use crate::error::{AnalysisError, Result};

fn term_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").unwrap())
}

pub fn analyze(document: &str) -> Vec<String> {
    term_pattern()
        .find_iter(&document.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    max_features: usize,
    vocabulary: Vec<String>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    pub fn new(max_features: usize) -> Self {
        TfIdfVectorizer {
            max_features,
            vocabulary: Vec::new(),
            idf: Vec::new(),
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Learns the vocabulary and idf weights from `documents` and returns
    /// their documents x terms matrix.
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Array2<f64>> {
        let analyzed: Vec<Vec<String>> = documents.iter().map(|doc| analyze(doc)).collect();

        let mut term_freq: Counter<String> = Counter::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for terms in &analyzed {
            for term in terms {
                term_freq[term] += 1;
            }
            let unique: HashSet<&String> = terms.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        if term_freq.is_empty() {
            return Err(AnalysisError::EmptyVocabulary);
        }

        let mut selected: Vec<String> = term_freq
            .most_common_ordered()
            .into_iter()
            .take(self.max_features)
            .map(|(term, _)| term)
            .collect();
        selected.sort();

        let n_docs = documents.len() as f64;
        self.idf = selected
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = selected;
        debug!(
            "TF-IDF vocabulary: {} of {} distinct terms",
            self.vocabulary.len(),
            term_freq.len()
        );

        let index: HashMap<&str, usize> = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let mut matrix = Array2::<f64>::zeros((documents.len(), self.vocabulary.len()));
        for (row, terms) in analyzed.iter().enumerate() {
            for term in terms {
                if let Some(&col) = index.get(term.as_str()) {
                    matrix[[row, col]] += 1.0;
                }
            }
        }

        for (col, idf) in self.idf.iter().enumerate() {
            matrix.column_mut(col).mapv_inplace(|tf| tf * idf);
        }

        for mut row in matrix.rows_mut() {
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }

        Ok(matrix)
    }
}
