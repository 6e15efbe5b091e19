//! Part-of-speech tagging with Penn Treebank tags.
//!
//! `RuleTagger` is a small lexicon-plus-suffix tagger in the style of an
//! initial-state Brill tagger: closed-class words come from a lexicon, open
//! class words are guessed from their suffix and capitalization, and a single
//! left-context pass fixes the most common verb/noun confusions.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::lemmatizer::is_ing_noun;

/// A word and its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

pub trait PosTagger {
    /// Tag every token. The output has one entry per input token, in order.
    fn tag(&self, tokens: &[String]) -> Vec<TaggedToken>;
}

static LEXICON: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let groups: &[(&str, &[&str])] = &[
        (
            "DT",
            &[
                "the", "a", "an", "this", "these", "those", "every", "each", "some", "any", "no",
                "all", "another", "both", "either", "neither",
            ],
        ),
        (
            "PRP",
            &[
                "i", "me", "you", "he", "him", "she", "it", "we", "us", "they", "them", "myself",
                "yourself", "yourselves", "himself", "herself", "itself", "ourselves",
                "themselves", "mine", "yours", "hers", "ours", "theirs",
            ],
        ),
        ("PRP$", &["my", "your", "his", "her", "its", "our", "their"]),
        (
            "IN",
            &[
                "of", "in", "on", "at", "by", "for", "with", "about", "against", "between",
                "into", "through", "during", "before", "after", "above", "below", "from", "over",
                "under", "than", "because", "while", "if", "as", "until", "since", "without",
                "within", "upon", "per", "via", "that", "whether", "despite", "toward", "towards",
                "among", "amid", "across", "behind", "beyond", "near", "off", "out", "up", "down",
            ],
        ),
        ("CC", &["and", "or", "but", "nor", "yet", "so", "&"]),
        ("TO", &["to"]),
        (
            "MD",
            &[
                "can", "could", "will", "would", "shall", "should", "may", "might", "must", "ca",
                "wo",
            ],
        ),
        ("VB", &["be", "have", "do"]),
        ("VBP", &["am", "are"]),
        ("VBZ", &["is", "has", "does"]),
        ("VBD", &["was", "were", "had", "did"]),
        ("VBN", &["been"]),
        ("VBG", &["being", "having", "doing"]),
        (
            "RB",
            &[
                "not", "n't", "very", "too", "also", "just", "never", "always", "often", "here",
                "there", "now", "then", "still", "again", "even", "only", "soon", "ever",
                "already", "almost", "once", "further", "however", "together", "rather",
            ],
        ),
        ("WP", &["what", "who", "whom", "whose"]),
        ("WDT", &["which", "whatever"]),
        ("WRB", &["when", "where", "why", "how"]),
        ("POS", &["'s", "'"]),
        ("JJ", &["other", "own", "same", "such", "few", "more", "most", "many", "much"]),
    ];
    let mut lexicon = HashMap::new();
    for (tag, words) in groups {
        for word in *words {
            lexicon.insert(*word, *tag);
        }
    }
    lexicon
});

const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "able", "ible", "ive", "less", "ical"];

/// Lexicon, punctuation, number and suffix rules, then one left-context pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTagger;

impl RuleTagger {
    pub fn new() -> Self {
        Self
    }

    /// Tag a token without looking at its neighbours.
    fn initial_tag(word: &str, position: usize) -> &'static str {
        let lower = word.to_lowercase();
        if let Some(tag) = LEXICON.get(lower.as_str()).copied() {
            return tag;
        }
        if let Some(tag) = punctuation_tag(word) {
            return tag;
        }
        if is_number(word) {
            return "CD";
        }
        if let Some(tag) = suffix_tag(&lower) {
            return tag;
        }
        if position > 0 && word.chars().next().is_some_and(char::is_uppercase) {
            return "NNP";
        }
        "NN"
    }
}

impl PosTagger for RuleTagger {
    fn tag(&self, tokens: &[String]) -> Vec<TaggedToken> {
        let mut tags: Vec<&'static str> = tokens
            .iter()
            .enumerate()
            .map(|(i, word)| Self::initial_tag(word, i))
            .collect();

        for i in 1..tags.len() {
            let prev = tags[i - 1];
            tags[i] = match (prev, tags[i]) {
                ("MD" | "TO", "NN" | "NNP" | "VBP") => "VB",
                ("NN" | "NNP" | "PRP", "NNS") => "VBZ",
                ("PRP", "NN") => "VBP",
                (_, current) => current,
            };
        }

        tokens
            .iter()
            .zip(tags)
            .map(|(word, tag)| TaggedToken {
                word: word.clone(),
                tag: tag.to_string(),
            })
            .collect()
    }
}

fn punctuation_tag(word: &str) -> Option<&'static str> {
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_punctuation()) {
        return None;
    }
    let tag = match word {
        "." | "!" | "?" => ".",
        "," => ",",
        ":" | ";" | "..." | "--" | "-" => ":",
        "``" => "``",
        "''" => "''",
        "(" | "[" | "{" => "(",
        ")" | "]" | "}" => ")",
        "$" => "$",
        "#" => "#",
        _ => "SYM",
    };
    Some(tag)
}

fn is_number(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_ascii_digit())
        && word
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | ':' | '/' | '%' | '-'))
}

fn suffix_tag(lower: &str) -> Option<&'static str> {
    let len = lower.chars().count();
    if len > 4 && lower.ends_with("ly") {
        Some("RB")
    } else if len > 4 && lower.ends_with("ing") && !is_ing_noun(lower) {
        Some("VBG")
    } else if len > 3 && lower.ends_with("ed") {
        Some("VBD")
    } else if ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s) && len > s.len() + 2) {
        Some("JJ")
    } else if len > 3
        && lower.ends_with('s')
        && !(lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is"))
    {
        Some("NNS")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(words: &[&str]) -> Vec<String> {
        let tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        RuleTagger::new()
            .tag(&tokens)
            .into_iter()
            .map(|t| t.tag)
            .collect()
    }

    #[test]
    fn test_tag_count_matches_input() {
        assert!(tags(&[]).is_empty());
        assert_eq!(tags(&["a", "b", "c"]).len(), 3);
    }

    #[test]
    fn test_closed_class_words() {
        assert_eq!(
            tags(&["The", "dog", "is", "in", "the", "house"]),
            vec!["DT", "NN", "VBZ", "IN", "DT", "NN"]
        );
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(
            tags(&["Dogs", "are", "running", "!", "quickly"]),
            vec!["NNS", "VBP", "VBG", ".", "RB"]
        );
        assert_eq!(tags(&["arrested"]), vec!["VBD"]);
        assert_eq!(tags(&["famous"]), vec!["JJ"]);
        assert_eq!(tags(&["glass"]), vec!["NN"]);
        assert_eq!(tags(&["morning", "Evening"]), vec!["NN", "NNP"]);
        assert_eq!(tags(&["Released"]), vec!["VBD"]);
    }

    #[test]
    fn test_capitalized_words_after_first_are_proper_nouns() {
        assert_eq!(tags(&["Area", "Man"]), vec!["NN", "NNP"]);
    }

    #[test]
    fn test_numbers_and_punctuation() {
        assert_eq!(
            tags(&["42", "3.5%", ",", "``", "''", "("]),
            vec!["CD", "CD", ",", "``", "''", "("]
        );
        assert_eq!(tags(&["*"]), vec!["SYM"]);
    }

    #[test]
    fn test_context_rules() {
        // -s word after a noun reads as a verb
        assert_eq!(tags(&["Nobody", "Knows"]), vec!["NN", "VBZ"]);
        // base form after a modal or `to`
        assert_eq!(tags(&["will", "Run"]), vec!["MD", "VB"]);
        assert_eq!(tags(&["to", "vote"]), vec!["TO", "VB"]);
        // base form after a pronoun
        assert_eq!(tags(&["they", "vote"]), vec!["PRP", "VBP"]);
    }

    #[test]
    fn test_tagged_token_keeps_original_word() {
        let tagged = RuleTagger::new().tag(&["Dogs".to_string()]);
        assert_eq!(
            tagged,
            vec![TaggedToken {
                word: "Dogs".to_string(),
                tag: "NNS".to_string()
            }]
        );
    }
}
