//! TF-IDF vectorizer: raw term counts weighted by smoothed inverse document
//! frequency, rows L2-normalized.

use std::collections::{HashMap, HashSet};

use crate::tokenize;

/// Sparse row: (term index, weight), sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    /// term -> column index, columns ordered alphabetically
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    doc_count: usize,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn vocabulary and idf from the documents.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let terms: HashSet<String> = tokenize::analyze(doc.as_ref()).into_iter().collect();
            for term in terms {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = doc_freq.into_iter().collect();
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let n = documents.len() as f64;
        self.doc_count = documents.len();
        self.vocabulary = HashMap::with_capacity(terms.len());
        self.idf = Vec::with_capacity(terms.len());
        for (idx, (term, df)) in terms.into_iter().enumerate() {
            let idf = ((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0;
            self.vocabulary.insert(term, idx);
            self.idf.push(idf);
        }
    }

    /// Vectorize one document. Terms outside the vocabulary are ignored; a
    /// document with no known terms maps to the empty vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for term in tokenize::analyze(document) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf as f64 * self.idf[idx]))
            .collect();
        row.sort_by_key(|&(idx, _)| idx);

        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in row.iter_mut() {
                *w /= norm;
            }
        }
        row
    }

    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents.iter().map(|d| self.transform(d.as_ref())).collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Vec<SparseVector> {
        self.fit(documents);
        self.transform_all(documents)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Number of documents seen by `fit`.
    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    #[cfg(test)]
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&idx| self.idf[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: &[&str] = &[
        "area man wins lottery",
        "area woman loses lottery",
        "senate passes bill",
    ];

    #[test]
    fn test_fit_builds_sorted_vocabulary() {
        let mut v = TfidfVectorizer::new();
        v.fit(DOCS);
        assert_eq!(v.vocabulary_len(), 9);
        assert_eq!(v.doc_count(), 3);
        assert_eq!(v.vocabulary.get("area"), Some(&0));
        assert_eq!(v.vocabulary.get("woman"), Some(&8));
    }

    #[test]
    fn test_idf_is_smoothed() {
        let mut v = TfidfVectorizer::new();
        v.fit(DOCS);
        // df = 2 of n = 3
        let expected = (4.0f64 / 3.0).ln() + 1.0;
        assert!((v.idf("area").unwrap() - expected).abs() < 1e-12);
        // df = 1
        let expected = 2.0f64.ln() + 1.0;
        assert!((v.idf("senate").unwrap() - expected).abs() < 1e-12);
        assert!(v.idf("unknown").is_none());
    }

    #[test]
    fn test_rows_are_unit_norm_and_sorted() {
        let mut v = TfidfVectorizer::new();
        let rows = v.fit_transform(DOCS);
        assert_eq!(rows.len(), 3);
        for row in &rows {
            let norm: f64 = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
            assert!(row.windows(2).all(|p| p[0].0 < p[1].0));
        }
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let mut v = TfidfVectorizer::new();
        v.fit(DOCS);
        let row = v.transform("area man");
        let area = row.iter().find(|(i, _)| *i == 0).unwrap().1;
        let man = row.iter().find(|(i, _)| *i == v.vocabulary["man"]).unwrap().1;
        assert!(man > area);
    }

    #[test]
    fn test_unknown_terms_are_ignored() {
        let mut v = TfidfVectorizer::new();
        v.fit(DOCS);
        assert!(v.transform("completely novel words").is_empty());
        assert!(v.transform("").is_empty());
        assert_eq!(v.transform("Senate, senate!").len(), 1);
    }
}
