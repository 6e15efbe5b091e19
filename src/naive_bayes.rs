//! Naive Bayes over presence features.
//!
//! Each headline is a set of lemmas; a lemma in the set is a feature with the
//! value "present". Label priors and per-label feature likelihoods use the
//! expected likelihood estimate (add 0.5 to every count). Only features present
//! in the input contribute at classification time, and features never seen in
//! training are ignored.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::dataset::Label;
use crate::error::{Error, Result};

/// The distinct lemmas of one headline.
pub type FeatureSet = BTreeSet<String>;

pub fn features<I: IntoIterator<Item = String>>(lemmas: I) -> FeatureSet {
    lemmas.into_iter().collect()
}

/// A feature and how strongly it points at one label.
#[derive(Debug, Clone, PartialEq)]
pub struct InformativeFeature {
    pub name: String,
    pub label: Label,
    /// Likelihood under `label` divided by the likelihood under the other label.
    pub ratio: f64,
}

#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    /// samples per label, indexed by `Label::as_u8`
    label_counts: [usize; 2],
    /// feature -> samples per label containing it
    feature_counts: HashMap<String, [usize; 2]>,
}

fn idx(label: Label) -> usize {
    label.as_u8() as usize
}

impl NaiveBayesClassifier {
    /// Train on labeled feature sets. Both labels must occur.
    pub fn train(samples: &[(FeatureSet, Label)]) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::ModelFit("no training samples".to_string()));
        }
        let mut label_counts = [0usize; 2];
        let mut feature_counts: HashMap<String, [usize; 2]> = HashMap::new();
        for (features, label) in samples {
            label_counts[idx(*label)] += 1;
            for name in features {
                feature_counts.entry(name.clone()).or_insert([0, 0])[idx(*label)] += 1;
            }
        }
        if label_counts.contains(&0) {
            return Err(Error::ModelFit(
                "training labels contain a single class".to_string(),
            ));
        }
        debug!(
            samples = samples.len(),
            features = feature_counts.len(),
            "naive bayes trained"
        );
        Ok(Self {
            label_counts,
            feature_counts,
        })
    }

    fn sample_count(&self) -> usize {
        self.label_counts.iter().sum()
    }

    fn prior(&self, label: Label) -> f64 {
        (self.label_counts[idx(label)] as f64 + 0.5) / (self.sample_count() as f64 + 1.0)
    }

    /// P(feature present | label). `None` for features never seen.
    fn likelihood(&self, name: &str, label: Label) -> Option<f64> {
        let counts = self.feature_counts.get(name)?;
        // "absent" is a possible value unless every sample had the feature
        let bins = if counts == &self.label_counts { 1.0 } else { 2.0 };
        let n_label = self.label_counts[idx(label)] as f64;
        Some((counts[idx(label)] as f64 + 0.5) / (n_label + 0.5 * bins))
    }

    /// Normalized probability of each label.
    pub fn prob_classify(&self, features: &FeatureSet) -> BTreeMap<Label, f64> {
        let log_probs: Vec<(Label, f64)> = Label::ALL
            .iter()
            .map(|&label| {
                let log_likelihood: f64 = features
                    .iter()
                    .filter_map(|name| self.likelihood(name, label))
                    .map(f64::ln)
                    .sum();
                (label, self.prior(label).ln() + log_likelihood)
            })
            .collect();

        let max = log_probs
            .iter()
            .map(|&(_, lp)| lp)
            .fold(f64::NEG_INFINITY, f64::max);
        let total: f64 = log_probs.iter().map(|&(_, lp)| (lp - max).exp()).sum();
        log_probs
            .into_iter()
            .map(|(label, lp)| (label, (lp - max).exp() / total))
            .collect()
    }

    /// Most probable label. Ties go to `Label::NotOnion`.
    pub fn classify(&self, features: &FeatureSet) -> Label {
        let probs = self.prob_classify(features);
        let mut best = Label::NotOnion;
        for label in Label::ALL {
            if probs[&label] > probs[&best] {
                best = label;
            }
        }
        best
    }

    /// Fraction of samples classified correctly.
    pub fn accuracy(&self, samples: &[(FeatureSet, Label)]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let correct = samples
            .iter()
            .filter(|(features, label)| self.classify(features) == *label)
            .count();
        correct as f64 / samples.len() as f64
    }

    /// The `n` features with the largest likelihood ratio between labels.
    pub fn most_informative_features(&self, n: usize) -> Vec<InformativeFeature> {
        let mut ranked: Vec<InformativeFeature> = self
            .feature_counts
            .keys()
            .filter_map(|name| {
                let onion = self.likelihood(name, Label::Onion)?;
                let not_onion = self.likelihood(name, Label::NotOnion)?;
                let (label, ratio) = if onion >= not_onion {
                    (Label::Onion, onion / not_onion)
                } else {
                    (Label::NotOnion, not_onion / onion)
                };
                Some(InformativeFeature {
                    name: name.clone(),
                    label,
                    ratio,
                })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.ratio
                .partial_cmp(&a.ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked.truncate(n);
        ranked
    }

    pub fn feature_count(&self) -> usize {
        self.feature_counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs(words: &[&str]) -> FeatureSet {
        features(words.iter().map(|w| w.to_string()))
    }

    fn training() -> Vec<(FeatureSet, Label)> {
        vec![
            (fs(&["area", "man"]), Label::Onion),
            (fs(&["area", "woman"]), Label::Onion),
            (fs(&["senate", "bill"]), Label::NotOnion),
            (fs(&["senate", "vote"]), Label::NotOnion),
        ]
    }

    #[test]
    fn test_classify_obvious_cases() {
        let nb = NaiveBayesClassifier::train(&training()).unwrap();
        assert_eq!(nb.classify(&fs(&["area"])), Label::Onion);
        assert_eq!(nb.classify(&fs(&["senate", "vote"])), Label::NotOnion);
        assert_eq!(nb.accuracy(&training()), 1.0);
        assert_eq!(nb.feature_count(), 6);
    }

    #[test]
    fn test_unseen_features_fall_back_to_prior() {
        let nb = NaiveBayesClassifier::train(&training()).unwrap();
        let probs = nb.prob_classify(&fs(&["zebra"]));
        assert!((probs[&Label::Onion] - 0.5).abs() < 1e-12);
        assert!((probs[&Label::NotOnion] - 0.5).abs() < 1e-12);
        assert_eq!(nb.classify(&fs(&[])), Label::NotOnion);
    }

    #[test]
    fn test_prior_is_expected_likelihood() {
        let mut samples = training();
        samples.push((fs(&["area"]), Label::Onion));
        let nb = NaiveBayesClassifier::train(&samples).unwrap();
        assert!((nb.prior(Label::Onion) - 3.5 / 6.0).abs() < 1e-12);
        assert!((nb.prior(Label::NotOnion) - 2.5 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let nb = NaiveBayesClassifier::train(&training()).unwrap();
        let probs = nb.prob_classify(&fs(&["area", "senate", "man"]));
        let total: f64 = probs.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(probs[&Label::Onion] > probs[&Label::NotOnion]);
    }

    #[test]
    fn test_most_informative_features() {
        let nb = NaiveBayesClassifier::train(&training()).unwrap();
        let top = nb.most_informative_features(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "area");
        assert_eq!(top[0].label, Label::Onion);
        assert!((top[0].ratio - 5.0).abs() < 1e-12);
        assert_eq!(top[1].name, "senate");
        assert_eq!(top[1].label, Label::NotOnion);
    }

    #[test]
    fn test_train_errors() {
        assert!(matches!(
            NaiveBayesClassifier::train(&[]),
            Err(Error::ModelFit(_))
        ));
        let one_class = vec![(fs(&["a"]), Label::Onion)];
        assert!(matches!(
            NaiveBayesClassifier::train(&one_class),
            Err(Error::ModelFit(_))
        ));
    }
}
