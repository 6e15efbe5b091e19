//! The two prediction pipelines and the glue shared by the CLI and the page.
//!
//! A: headline -> TF-IDF -> logistic regression.
//! B: headline -> word tokens -> normalized lemmas -> presence features -> Naive Bayes.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::config::Config;
use crate::config::{LogisticConfig, NaiveBayesConfig};
use crate::dataset::{self, Dataset, Label};
use crate::error::{Error, Result};
use crate::logistic::LogisticRegression;
use crate::naive_bayes::{self, FeatureSet, InformativeFeature, NaiveBayesClassifier};
use crate::normalize::MemoNormalizer;
use crate::stopwords;
use crate::tfidf::TfidfVectorizer;
use crate::tokenize::word_tokenize;

/// Process-wide normalizer cache, shared by every Naive Bayes model.
pub type SharedNormalizer = Arc<Mutex<MemoNormalizer>>;

pub fn shared_normalizer() -> SharedNormalizer {
    Arc::new(Mutex::new(MemoNormalizer::new(stopwords::english())))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pipeline {
    LogisticRegression,
    NaiveBayes,
}

impl Pipeline {
    pub const ALL: [Pipeline; 2] = [Pipeline::LogisticRegression, Pipeline::NaiveBayes];

    /// Short name used in URLs and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Pipeline::LogisticRegression => "lr",
            Pipeline::NaiveBayes => "nb",
        }
    }

    /// Selector option text.
    pub fn title(self) -> &'static str {
        match self {
            Pipeline::LogisticRegression => "Logistic Regression, Quick and Dirty",
            Pipeline::NaiveBayes => "Naive Bayes, NLTK Processed",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Pipeline::LogisticRegression => "Model used: Logistic Regression",
            Pipeline::NaiveBayes => "Model used: Naive Bayes, processed with NLTK",
        }
    }

    /// Lowercase name used in running text.
    pub fn model_name(self) -> &'static str {
        match self {
            Pipeline::LogisticRegression => "logistic regression",
            Pipeline::NaiveBayes => "naive bayes",
        }
    }

    /// Pre-filled headline for the input box.
    pub fn sample_headline(self) -> &'static str {
        match self {
            Pipeline::LogisticRegression => {
                "CIA Realizes It's Been Using Black Highlighters All These Years"
            }
            Pipeline::NaiveBayes => "MLS Commissioner Relieved That Nobody Knows Him by Name",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Pipeline::LogisticRegression => "Onion or not?",
            Pipeline::NaiveBayes => "Onion or not? Round 2",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Pipeline {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lr" | "logistic" | "logistic-regression" => Ok(Pipeline::LogisticRegression),
            "nb" | "naive-bayes" | "bayes" => Ok(Pipeline::NaiveBayes),
            other => Err(Error::InvalidInput(format!(
                "unknown model {other:?}, expected \"lr\" or \"nb\""
            ))),
        }
    }
}

/// Accuracy as a percentage, rounded to four decimals of the raw score.
pub fn rounded_percent(score: f64) -> f64 {
    (score * 10_000.0).round() / 100.0
}

fn check_headline(headline: &str) -> Result<&str> {
    let headline = headline.trim();
    if headline.is_empty() {
        return Err(Error::InvalidInput("headline is empty".to_string()));
    }
    Ok(headline)
}

/// Pipeline A, fitted.
pub struct LogisticModel {
    vectorizer: TfidfVectorizer,
    classifier: LogisticRegression,
    accuracy: f64,
}

impl LogisticModel {
    pub fn fit(dataset: &Dataset, config: &LogisticConfig) -> Result<Self> {
        let (train, test) =
            dataset::train_test_split(dataset.headlines(), config.test_fraction, config.seed)?;
        let train_texts: Vec<&str> = train.iter().map(|h| h.text.as_str()).collect();
        let train_labels: Vec<Label> = train.iter().map(|h| h.label).collect();
        let test_texts: Vec<&str> = test.iter().map(|h| h.text.as_str()).collect();
        let test_labels: Vec<Label> = test.iter().map(|h| h.label).collect();

        let mut vectorizer = TfidfVectorizer::new();
        let x_train = vectorizer.fit_transform(&train_texts);
        let x_test = vectorizer.transform_all(&test_texts);

        let mut classifier = LogisticRegression::from_config(config);
        classifier.fit(&x_train, &train_labels, vectorizer.vocabulary_len())?;
        let accuracy = classifier.score(&x_test, &test_labels);
        info!(
            train = vectorizer.doc_count(),
            test = test.len(),
            vocabulary = vectorizer.vocabulary_len(),
            iterations = classifier.n_iter(),
            accuracy,
            "logistic regression ready"
        );
        Ok(Self {
            vectorizer,
            classifier,
            accuracy,
        })
    }

    pub fn predict(&self, headline: &str) -> Result<Label> {
        let headline = check_headline(headline)?;
        Ok(self.classifier.predict(&self.vectorizer.transform(headline)))
    }
}

/// Pipeline B, fitted.
pub struct NaiveBayesModel {
    classifier: NaiveBayesClassifier,
    normalizer: SharedNormalizer,
    accuracy: f64,
}

/// Word-tokenize and normalize through the shared cache, keeping token order.
pub fn normalize_text(normalizer: &SharedNormalizer, text: &str) -> Vec<String> {
    let tokens = word_tokenize(text);
    normalizer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .normalize(&tokens)
}

/// Presence features of a headline.
pub fn featurize(normalizer: &SharedNormalizer, headline: &str) -> FeatureSet {
    naive_bayes::features(normalize_text(normalizer, headline))
}

impl NaiveBayesModel {
    pub fn fit(
        dataset: &Dataset,
        config: &NaiveBayesConfig,
        normalizer: SharedNormalizer,
    ) -> Result<Self> {
        let mut labeled: Vec<(FeatureSet, Label)> = Vec::with_capacity(dataset.len());
        for label in [Label::Onion, Label::NotOnion] {
            for text in dataset.texts_with(label) {
                labeled.push((featurize(&normalizer, text), label));
            }
        }
        {
            let memo = normalizer.lock().unwrap_or_else(PoisonError::into_inner);
            debug!(
                entries = memo.len(),
                hits = memo.hits(),
                misses = memo.misses(),
                "headlines normalized"
            );
        }

        let (train, test) =
            dataset::fixed_size_split(labeled, config.train_fraction, config.seed)?;
        let classifier = NaiveBayesClassifier::train(&train)?;
        let accuracy = classifier.accuracy(&test);
        info!(
            train = train.len(),
            test = test.len(),
            features = classifier.feature_count(),
            accuracy,
            "naive bayes ready"
        );
        Ok(Self {
            classifier,
            normalizer,
            accuracy,
        })
    }

    pub fn predict(&self, headline: &str) -> Result<Label> {
        let headline = check_headline(headline)?;
        Ok(self.classifier.classify(&featurize(&self.normalizer, headline)))
    }

    pub fn most_informative_features(&self, n: usize) -> Vec<InformativeFeature> {
        self.classifier.most_informative_features(n)
    }
}

/// Either fitted pipeline.
pub enum FittedModel {
    Logistic(LogisticModel),
    NaiveBayes(NaiveBayesModel),
}

impl FittedModel {
    pub fn fit(
        pipeline: Pipeline,
        dataset: &Dataset,
        config: &Config,
        normalizer: &SharedNormalizer,
    ) -> Result<Self> {
        info!(model = %pipeline, "fitting model");
        match pipeline {
            Pipeline::LogisticRegression => {
                LogisticModel::fit(dataset, &config.logistic).map(FittedModel::Logistic)
            }
            Pipeline::NaiveBayes => {
                NaiveBayesModel::fit(dataset, &config.naive_bayes, Arc::clone(normalizer))
                    .map(FittedModel::NaiveBayes)
            }
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        match self {
            FittedModel::Logistic(_) => Pipeline::LogisticRegression,
            FittedModel::NaiveBayes(_) => Pipeline::NaiveBayes,
        }
    }

    /// Test-set accuracy in [0, 1].
    pub fn accuracy(&self) -> f64 {
        match self {
            FittedModel::Logistic(m) => m.accuracy,
            FittedModel::NaiveBayes(m) => m.accuracy,
        }
    }

    pub fn accuracy_percent(&self) -> f64 {
        rounded_percent(self.accuracy())
    }

    pub fn predict(&self, headline: &str) -> Result<Label> {
        match self {
            FittedModel::Logistic(m) => m.predict(headline),
            FittedModel::NaiveBayes(m) => m.predict(headline),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::Headline;

    const ONION: &[&str] = &[
        "Area Man Wins Lottery Of Being Alive",
        "Area Woman Realizes She Has Been Dead For Years",
        "Local Dad Announces Plan To Finally Fix Gutter",
        "Area Man Passionate Defender Of What He Imagines Constitution To Be",
        "Nation Shocked To Learn Area Man Has Hobbies",
        "Area Teen Announces Plan To Sleep Forever",
        "Local Man Realizes He Has Been Wrong About Everything",
        "Area Dad Finally Understands Internet",
    ];

    const NOT_ONION: &[&str] = &[
        "Senate Passes Budget Bill After Long Debate",
        "Police Arrest Suspect In Bank Robbery",
        "Governor Signs Bill On School Funding",
        "Court Rules Against Airline In Fee Dispute",
        "Senate Committee Delays Vote On Budget",
        "Police Investigate Robbery At Downtown Bank",
        "Court Orders Airline To Refund Passengers",
        "Governor Vetoes School Funding Bill",
    ];

    /// Small labeled dataset with an obvious vocabulary split.
    pub(crate) fn toy_dataset() -> Dataset {
        let mut headlines = Vec::new();
        for _ in 0..3 {
            headlines.extend(ONION.iter().map(|t| Headline::new(*t, Label::Onion)));
            headlines.extend(NOT_ONION.iter().map(|t| Headline::new(*t, Label::NotOnion)));
        }
        Dataset::from_headlines(headlines)
    }

    #[test]
    fn test_rounded_percent() {
        assert_eq!(rounded_percent(0.81234), 81.23);
        assert_eq!(rounded_percent(1.0), 100.0);
        assert_eq!(rounded_percent(0.0), 0.0);
        assert_eq!(rounded_percent(0.5), 50.0);
    }

    #[test]
    fn test_pipeline_parse_and_labels() {
        assert_eq!("lr".parse::<Pipeline>().unwrap(), Pipeline::LogisticRegression);
        assert_eq!(" NB ".parse::<Pipeline>().unwrap(), Pipeline::NaiveBayes);
        assert!(matches!("svm".parse::<Pipeline>(), Err(Error::InvalidInput(_))));
        for pipeline in Pipeline::ALL {
            assert_eq!(pipeline.key().parse::<Pipeline>().unwrap(), pipeline);
        }
        assert_eq!(Pipeline::NaiveBayes.title(), "Naive Bayes, NLTK Processed");
        assert_eq!(Pipeline::LogisticRegression.button_label(), "Onion or not?");
    }

    #[test]
    fn test_logistic_pipeline_end_to_end() {
        let config = Config::default();
        let model = FittedModel::fit(
            Pipeline::LogisticRegression,
            &toy_dataset(),
            &config,
            &shared_normalizer(),
        )
        .unwrap();
        assert_eq!(model.pipeline(), Pipeline::LogisticRegression);
        assert!(model.accuracy() > 0.75);
        assert_eq!(model.predict("Area Man Announces Plan").unwrap(), Label::Onion);
        assert_eq!(
            model.predict("Senate Budget Bill Vote").unwrap(),
            Label::NotOnion
        );
        assert!(matches!(model.predict("   "), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_naive_bayes_pipeline_end_to_end() {
        let config = Config::default();
        let normalizer = shared_normalizer();
        let model =
            FittedModel::fit(Pipeline::NaiveBayes, &toy_dataset(), &config, &normalizer).unwrap();
        assert_eq!(model.pipeline(), Pipeline::NaiveBayes);
        assert!(model.accuracy() > 0.75);
        assert_eq!(model.predict("Area Man Announces Plan").unwrap(), Label::Onion);
        assert_eq!(
            model.predict("Police Arrest Governor").unwrap(),
            Label::NotOnion
        );
        assert!(matches!(model.predict(""), Err(Error::InvalidInput(_))));

        // 16 distinct training headlines plus the two predicted ones
        let memo = normalizer.lock().unwrap();
        assert_eq!(memo.len(), 18);
        assert!(memo.hits() >= 32);
    }

    #[test]
    fn test_fit_rejects_single_class() {
        let ds = Dataset::from_headlines(
            ONION.iter().map(|t| Headline::new(*t, Label::Onion)).collect(),
        );
        let config = Config::default();
        for pipeline in Pipeline::ALL {
            let result = FittedModel::fit(pipeline, &ds, &config, &shared_normalizer());
            assert!(matches!(result, Err(Error::ModelFit(_))));
        }
    }
}
