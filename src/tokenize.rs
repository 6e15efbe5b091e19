//! Text to word tokenization: Treebank-style word splitting for lemma
//! features, and a lowercase word-pattern analyzer for TF-IDF.

use std::sync::LazyLock;

use regex::Regex;

/// Tokens of two or more word characters.
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Ordered (pattern, replacement) rewrites. After they run, splitting on
/// whitespace yields the tokens.
static TREEBANK_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // starting quotes
        (r#"^""#, "``"),
        (r"(``)", " $1 "),
        (r#"([ (\[{<])("|'')"#, "$1 `` "),
        // punctuation
        (r#"([^.])(\.)([\])}>"']*)\s*$"#, "$1 $2 $3 "),
        (r"([:,])([^\d])", " $1 $2"),
        (r"([:,])$", " $1 "),
        (r"\.\.\.", " ... "),
        (r"[;@#$%&]", " $0 "),
        (r"[?!]", " $0 "),
        (r"([^'])' ", "$1 ' "),
        (r"[\]\[(){}<>]", " $0 "),
        (r"--", " -- "),
        // padding so clitic rules can anchor on a trailing space
        (r"^", " "),
        (r"$", " "),
        // ending quotes and clitics
        (r"''", " '' "),
        (r#"""#, " '' "),
        (r"([^' ])('[sS]|'[mM]|'[dD]|') ", "$1 $2 "),
        (r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "$1 $2 "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

/// Split a headline into word tokens. Punctuation becomes its own token,
/// clitics are split off ("It's" -> "It", "'s"; "can't" -> "ca", "n't") and
/// double quotes become `` and ''. Case is preserved.
pub fn word_tokenize(text: &str) -> Vec<String> {
    let mut text = text.to_string();
    for (pattern, replacement) in TREEBANK_RULES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    text.split_whitespace().map(str::to_string).collect()
}

/// Lowercase the text and return every run of two or more word characters.
pub fn analyze(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokenize_splits_punctuation() {
        assert_eq!(
            word_tokenize("Dogs are running!"),
            vec!["Dogs", "are", "running", "!"]
        );
        assert_eq!(
            word_tokenize("Man Arrested, Released."),
            vec!["Man", "Arrested", ",", "Released", "."]
        );
    }

    #[test]
    fn test_word_tokenize_splits_clitics() {
        assert_eq!(
            word_tokenize("CIA Realizes It's Been Using Black Highlighters"),
            vec!["CIA", "Realizes", "It", "'s", "Been", "Using", "Black", "Highlighters"]
        );
        assert_eq!(word_tokenize("I can't go"), vec!["I", "ca", "n't", "go"]);
    }

    #[test]
    fn test_word_tokenize_quotes() {
        assert_eq!(
            word_tokenize(r#"Senator Says "No" Again"#),
            vec!["Senator", "Says", "``", "No", "''", "Again"]
        );
    }

    #[test]
    fn test_word_tokenize_keeps_inner_periods_and_hyphens() {
        assert_eq!(
            word_tokenize("U.S. Well-Known Area Man"),
            vec!["U.S.", "Well-Known", "Area", "Man"]
        );
    }

    #[test]
    fn test_word_tokenize_empty() {
        assert!(word_tokenize("").is_empty());
        assert!(word_tokenize("   ").is_empty());
    }

    #[test]
    fn test_analyze_lowercases_and_drops_single_chars() {
        assert_eq!(
            analyze("Area Man's 2 Cats: A Story"),
            vec!["area", "man", "cats", "story"]
        );
    }
}
