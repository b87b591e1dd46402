//! TF-IDF vectorizer for short metadata documents.
//!
//! ## Algorithm
//! 1. Tokenize: lowercase, split on anything that is not alphanumeric or
//!    `_`, keep tokens of two or more characters, drop English stop words
//! 2. Vocabulary: the `max_features` most frequent terms over the corpus
//!    (ties alphabetical), indexed alphabetically
//! 3. Weight: raw term count × smooth idf `ln((1 + n) / (1 + df)) + 1`
//! 4. Normalize every row to unit L2 length (empty rows stay empty)

use crate::stopwords::is_stop_word;
use rayon::prelude::*;
use sprs::{CsMat, TriMat};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: BTreeMap<String, usize>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: BTreeMap::new(),
        }
    }

    /// Term → column index of the fitted vocabulary
    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Learn the vocabulary and idf weights, returning one row per document
    pub fn fit_transform(&mut self, documents: &[String]) -> CsMat<f32> {
        let counts: Vec<HashMap<String, usize>> =
            documents.par_iter().map(|doc| term_counts(doc)).collect();

        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for (term, &count) in doc {
                *corpus_freq.entry(term.as_str()).or_insert(0) += count;
            }
        }
        let mut ranked: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();
        self.vocabulary = kept
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        let n_docs = documents.len() as f32;
        let mut doc_freq = vec![0usize; self.vocabulary.len()];
        for doc in &counts {
            for term in doc.keys() {
                if let Some(&col) = self.vocabulary.get(term) {
                    doc_freq[col] += 1;
                }
            }
        }
        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let mut tri = TriMat::new((documents.len(), self.vocabulary.len()));
        for (row, doc) in counts.iter().enumerate() {
            let weights: Vec<(usize, f32)> = doc
                .iter()
                .filter_map(|(term, &count)| {
                    self.vocabulary
                        .get(term)
                        .map(|&col| (col, count as f32 * idf[col]))
                })
                .collect();
            let norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for (col, weight) in weights {
                    tri.add_triplet(row, col, weight / norm);
                }
            }
        }
        tri.to_csr()
    }
}

/// Token counts of one document
fn term_counts(document: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokenize(document) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

pub fn tokenize(document: &str) -> impl Iterator<Item = String> + '_ {
    document
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|token| !is_stop_word(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_tokens_and_stop_words() {
        let tokens: Vec<String> = tokenize("Sci-Fi Action|the Dark Knight a").collect();
        assert_eq!(tokens, ["sci", "fi", "action", "dark", "knight"]);
    }

    #[test]
    fn test_vocabulary_cap_keeps_most_frequent() {
        let docs = vec![
            "drama drama comedy".to_string(),
            "drama horror".to_string(),
            "comedy".to_string(),
        ];
        let mut vectorizer = TfidfVectorizer::new(2);
        let matrix = vectorizer.fit_transform(&docs);

        let terms: Vec<&str> = vectorizer.vocabulary().keys().map(String::as_str).collect();
        assert_eq!(terms, ["comedy", "drama"]);
        assert_eq!(matrix.cols(), 2);
        assert_eq!(matrix.rows(), 3);
    }

    #[test]
    fn test_rows_are_unit_length() {
        let docs = vec![
            "war drama".to_string(),
            "war war comedy".to_string(),
            "the".to_string(),
        ];
        let mut vectorizer = TfidfVectorizer::new(100);
        let matrix = vectorizer.fit_transform(&docs);

        for (row, vec) in matrix.outer_iterator().enumerate() {
            let norm: f32 = vec.iter().map(|(_, &v)| v * v).sum::<f32>().sqrt();
            if row == 2 {
                assert_eq!(vec.nnz(), 0);
            } else {
                assert!((norm - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_smooth_idf_weights_rare_terms_higher() {
        let docs = vec!["war drama".to_string(), "war".to_string()];
        let mut vectorizer = TfidfVectorizer::new(100);
        let matrix = vectorizer.fit_transform(&docs);

        let drama = vectorizer.vocabulary()["drama"];
        let war = vectorizer.vocabulary()["war"];
        let row = matrix.outer_view(0).unwrap();
        assert!(row.get(drama).unwrap() > row.get(war).unwrap());
    }
}
