//! Rule-based English lemmatization.
//!
//! Irregular forms come from small exception tables; regular inflections are
//! undone with suffix rules. After an `-ing`/`-ed` strip, the stem is repaired
//! the way Porter's step 1b does it: `at`/`bl`/`iz` regain their `e`, a
//! doubled final consonant is undoubled, and a single-syllable
//! consonant-vowel-consonant stem regains a silent `e`. Stems ending in a
//! vowel plus `s`, `z` or `c` (releas, caus, freez, produc) also regain it.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Which word class to lemmatize as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LemmaMode {
    Noun,
    Verb,
    Adjective,
}

pub trait Lemmatizer {
    /// Base form of `word` in the given mode. An empty result means the word
    /// has no usable lemma.
    fn lemmatize(&self, word: &str, mode: LemmaMode) -> String;
}

fn table(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
    pairs.iter().copied().collect()
}

static IRREGULAR_NOUNS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    table(&[
        ("men", "man"),
        ("women", "woman"),
        ("children", "child"),
        ("mice", "mouse"),
        ("geese", "goose"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("oxen", "ox"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("wolves", "wolf"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("thieves", "thief"),
        ("loaves", "loaf"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("analyses", "analysis"),
        ("crises", "crisis"),
        ("theses", "thesis"),
    ])
});

/// Nouns whose plural and singular coincide, or that only look plural.
static UNINFLECTED_NOUNS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "news", "series", "species", "means", "physics", "mathematics", "politics", "economics",
        "athletics", "aircraft", "sheep", "deer", "fish", "police", "headquarters", "clothes",
        "ethics", "olympics", "diabetes", "measles",
    ]
    .into_iter()
    .collect()
});

/// Words whose final `s` is not an inflection.
static S_FINAL_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "bias", "alias", "atlas", "canvas", "christmas", "texas", "kansas", "arkansas", "focus",
        "bus", "gas", "lens", "chaos", "ethos", "cosmos", "pancreas",
    ]
    .into_iter()
    .collect()
});

/// Nouns that end in `-ing` without being a verb form.
static ING_NOUNS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "morning", "evening", "building", "wedding", "ceiling", "nothing", "something",
        "anything", "everything", "clothing", "pudding", "spring", "string", "thing", "king",
        "ring", "wing",
    ]
    .into_iter()
    .collect()
});

/// True for nouns like "morning" that only look like a present participle.
pub fn is_ing_noun(word: &str) -> bool {
    ING_NOUNS.contains(word)
}

static IRREGULAR_VERBS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    table(&[
        ("went", "go"),
        ("gone", "go"),
        ("goes", "go"),
        ("said", "say"),
        ("made", "make"),
        ("took", "take"),
        ("taken", "take"),
        ("came", "come"),
        ("saw", "see"),
        ("seen", "see"),
        ("got", "get"),
        ("gotten", "get"),
        ("gave", "give"),
        ("given", "give"),
        ("found", "find"),
        ("thought", "think"),
        ("told", "tell"),
        ("became", "become"),
        ("left", "leave"),
        ("felt", "feel"),
        ("brought", "bring"),
        ("began", "begin"),
        ("begun", "begin"),
        ("kept", "keep"),
        ("held", "hold"),
        ("wrote", "write"),
        ("written", "write"),
        ("stood", "stand"),
        ("heard", "hear"),
        ("meant", "mean"),
        ("met", "meet"),
        ("ran", "run"),
        ("paid", "pay"),
        ("sat", "sit"),
        ("spoke", "speak"),
        ("spoken", "speak"),
        ("led", "lead"),
        ("grew", "grow"),
        ("grown", "grow"),
        ("lost", "lose"),
        ("fell", "fall"),
        ("fallen", "fall"),
        ("sent", "send"),
        ("built", "build"),
        ("understood", "understand"),
        ("knew", "know"),
        ("known", "know"),
        ("drew", "draw"),
        ("drawn", "draw"),
        ("broke", "break"),
        ("broken", "break"),
        ("spent", "spend"),
        ("won", "win"),
        ("taught", "teach"),
        ("bought", "buy"),
        ("caught", "catch"),
        ("fought", "fight"),
        ("ate", "eat"),
        ("eaten", "eat"),
        ("drove", "drive"),
        ("driven", "drive"),
        ("chose", "choose"),
        ("chosen", "choose"),
        ("wore", "wear"),
        ("worn", "wear"),
        ("threw", "throw"),
        ("thrown", "throw"),
        ("flew", "fly"),
        ("flown", "fly"),
        ("sold", "sell"),
        ("slept", "sleep"),
        ("dying", "die"),
        ("lying", "lie"),
        ("tying", "tie"),
        ("agreed", "agree"),
        ("freed", "free"),
        ("fled", "flee"),
        ("shot", "shoot"),
        ("hid", "hide"),
        ("hidden", "hide"),
        ("stole", "steal"),
        ("stolen", "steal"),
        ("woke", "wake"),
        ("forgot", "forget"),
        ("forgotten", "forget"),
    ])
});

/// Auxiliary forms are returned unchanged; stop lists name them directly.
static AUXILIARIES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "am", "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "having",
        "do", "does", "did", "doing",
    ]
    .into_iter()
    .collect()
});

static IRREGULAR_ADJECTIVES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    table(&[
        ("better", "good"),
        ("best", "good"),
        ("worse", "bad"),
        ("worst", "bad"),
        ("further", "far"),
        ("farther", "far"),
    ])
});

/// Words ending in -er/-est that are not comparatives.
static NON_COMPARATIVES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "after", "ever", "never", "over", "under", "other", "another", "rather", "however",
        "whatever", "whenever", "wherever", "whether", "together", "either", "neither", "her",
        "per", "upper", "inner", "outer", "former", "latter", "forever", "forest", "honest",
        "modest", "interest", "west", "rest", "test", "contest", "protest", "request", "guest",
        "chest", "nest", "pest", "vest", "harvest", "earnest", "manifest", "arrest", "invest",
        "digest", "suggest", "lest",
    ]
    .into_iter()
    .collect()
});

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| is_vowel(c) || c == 'y')
}

/// Number of vowel groups, Porter's `m` measure in spirit.
fn syllables(s: &str) -> usize {
    let mut count = 0;
    let mut in_vowel = false;
    for (i, c) in s.chars().enumerate() {
        let vowel = is_vowel(c) || (c == 'y' && i > 0);
        if vowel && !in_vowel {
            count += 1;
        }
        in_vowel = vowel;
    }
    count
}

/// Stem ends consonant-vowel-consonant (the word start counts as a consonant),
/// and the final consonant is not w, x or y.
fn ends_cvc(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    if n < 2 {
        return false;
    }
    let last = chars[n - 1];
    let mid = chars[n - 2];
    let first_is_consonant = n < 3 || !is_vowel(chars[n - 3]);
    !is_vowel(last) && !matches!(last, 'w' | 'x' | 'y') && is_vowel(mid) && first_is_consonant
}

/// Repair a stem after an `-ing`, `-ed`, `-er` or `-est` strip.
fn restore_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if ["at", "bl", "iz", "rc", "nc", "v"].iter().any(|s| stem.ends_with(s)) {
        return format!("{stem}e");
    }
    if S_FINAL_WORDS.contains(stem) {
        return stem.to_string();
    }
    // releas(e), caus(e), freez(e), produc(e); nurs(e), licens(e), collaps(e), puls(e)
    if n >= 2
        && ((is_vowel(chars[n - 2]) && matches!(chars[n - 1], 's' | 'z' | 'c'))
            || (chars[n - 1] == 's' && matches!(chars[n - 2], 'r' | 'n' | 'p' | 'l')))
    {
        return format!("{stem}e");
    }
    if n >= 4
        && chars[n - 1] == chars[n - 2]
        && !is_vowel(chars[n - 1])
        && !matches!(chars[n - 1], 'l' | 's' | 'z' | 'f')
    {
        return chars[..n - 1].iter().collect();
    }
    if syllables(stem) == 1 && ends_cvc(stem) {
        return format!("{stem}e");
    }
    stem.to_string()
}

/// Strip a plural or third-person `-s`.
fn strip_s(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return if stem.chars().count() >= 2 {
            format!("{stem}y")
        } else {
            format!("{stem}ie")
        };
    }
    if ["sses", "shes", "ches", "xes"].iter().any(|s| word.ends_with(s)) {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("ss")
        || word.ends_with("us")
        || word.ends_with("is")
        || S_FINAL_WORDS.contains(word)
    {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

fn lemmatize_noun(word: &str) -> String {
    if let Some(lemma) = IRREGULAR_NOUNS.get(word) {
        return lemma.to_string();
    }
    if UNINFLECTED_NOUNS.contains(word) || word.chars().count() <= 3 || word.ends_with("'s") {
        return word.to_string();
    }
    strip_s(word)
}

fn lemmatize_verb(word: &str) -> String {
    if AUXILIARIES.contains(word) || ING_NOUNS.contains(word) {
        return word.to_string();
    }
    if let Some(lemma) = IRREGULAR_VERBS.get(word) {
        return lemma.to_string();
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if has_vowel(stem) && stem.chars().count() >= 2 {
            return restore_stem(stem);
        }
        return word.to_string();
    }
    if word.ends_with("eed") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ied") {
        return if stem.chars().count() >= 2 {
            format!("{stem}y")
        } else {
            format!("{stem}ie")
        };
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if has_vowel(stem) && stem.chars().count() >= 2 {
            return restore_stem(stem);
        }
        return word.to_string();
    }
    if word.ends_with("oes") {
        return word[..word.len() - 2].to_string();
    }
    if word.chars().count() <= 3 {
        return word.to_string();
    }
    strip_s(word)
}

fn lemmatize_adjective(word: &str) -> String {
    if let Some(lemma) = IRREGULAR_ADJECTIVES.get(word) {
        return lemma.to_string();
    }
    if NON_COMPARATIVES.contains(word) {
        return word.to_string();
    }
    for (suffix, min_stem) in [("iest", 2), ("ier", 2)] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if stem.chars().count() >= min_stem {
                return format!("{stem}y");
            }
        }
    }
    for suffix in ["est", "er"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if stem.chars().count() >= 3 && has_vowel(stem) {
                return restore_stem(stem);
            }
        }
    }
    word.to_string()
}

/// Exception tables plus suffix rules. Lemmas are lowercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleLemmatizer;

impl RuleLemmatizer {
    pub fn new() -> Self {
        Self
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, word: &str, mode: LemmaMode) -> String {
        let word = word.trim();
        if word.is_empty() {
            return String::new();
        }
        let lower = word.to_lowercase();
        // punctuation, numbers and symbols have no inflection
        if !lower.chars().any(char::is_alphabetic) {
            return lower;
        }
        match mode {
            LemmaMode::Noun => lemmatize_noun(&lower),
            LemmaMode::Verb => lemmatize_verb(&lower),
            LemmaMode::Adjective => lemmatize_adjective(&lower),
        }
    }
}
