//! Token normalization: tag, lemmatize, lowercase, then drop punctuation and
//! stop words.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::lemmatizer::{LemmaMode, Lemmatizer, RuleLemmatizer};
use crate::tagger::{PosTagger, RuleTagger};

/// ASCII punctuation in the order `!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~`.
pub const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Tag to lemmatizer mode. `NN*` is a noun, `VB*` a verb, everything else is
/// lemmatized as an adjective.
pub fn lemma_mode(tag: &str) -> LemmaMode {
    if tag.starts_with("NN") {
        LemmaMode::Noun
    } else if tag.starts_with("VB") {
        LemmaMode::Verb
    } else {
        LemmaMode::Adjective
    }
}

/// True for any non-empty run of consecutive characters of [`PUNCTUATION`].
pub fn is_punctuation(s: &str) -> bool {
    !s.is_empty() && PUNCTUATION.contains(s)
}

pub struct TokenNormalizer<T = RuleTagger, L = RuleLemmatizer> {
    tagger: T,
    lemmatizer: L,
}

impl TokenNormalizer {
    pub fn new() -> Self {
        Self::with_parts(RuleTagger::new(), RuleLemmatizer::new())
    }
}

impl Default for TokenNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PosTagger, L: Lemmatizer> TokenNormalizer<T, L> {
    pub fn with_parts(tagger: T, lemmatizer: L) -> Self {
        Self { tagger, lemmatizer }
    }

    /// Turn raw word tokens into cleaned lowercase lemmas, in order.
    ///
    /// `stop_words` is matched case-sensitively against the lowercased lemma,
    /// so callers pass a lowercase set. Never fails: a token with no lemma is
    /// dropped.
    pub fn normalize(&self, tokens: &[String], stop_words: &HashSet<String>) -> Vec<String> {
        let mut cleaned = Vec::new();
        for tagged in self.tagger.tag(tokens) {
            let lemma = self.lemmatizer.lemmatize(&tagged.word, lemma_mode(&tagged.tag));
            let lowered = lemma.to_lowercase();
            if !lemma.is_empty() && !is_punctuation(&lemma) && !stop_words.contains(&lowered) {
                cleaned.push(lowered);
            }
        }
        cleaned
    }
}

/// A normalizer bound to one stop-word set, remembering every token sequence
/// it has seen. Entries are never evicted.
pub struct MemoNormalizer<T = RuleTagger, L = RuleLemmatizer> {
    normalizer: TokenNormalizer<T, L>,
    stop_words: HashSet<String>,
    cache: HashMap<Vec<String>, Vec<String>>,
    hits: u64,
    misses: u64,
}

impl MemoNormalizer {
    pub fn new(stop_words: HashSet<String>) -> Self {
        Self::with_normalizer(TokenNormalizer::new(), stop_words)
    }
}

impl<T: PosTagger, L: Lemmatizer> MemoNormalizer<T, L> {
    pub fn with_normalizer(normalizer: TokenNormalizer<T, L>, stop_words: HashSet<String>) -> Self {
        Self {
            normalizer,
            stop_words,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn normalize(&mut self, tokens: &[String]) -> Vec<String> {
        if let Some(cleaned) = self.cache.get(tokens) {
            self.hits += 1;
            return cleaned.clone();
        }
        self.misses += 1;
        let cleaned = self.normalizer.normalize(tokens, &self.stop_words);
        self.cache.insert(tokens.to_vec(), cleaned.clone());
        if self.misses % 5000 == 0 {
            debug!(entries = self.cache.len(), hits = self.hits, "normalizer cache");
        }
        cleaned
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
