// Lexical feature detection - negation and sentiment word indicators
use serde::{Deserialize, Serialize};

/// Negation words, matched as whole tokens.
pub const NEGATION_WORDS: [&str; 5] = ["not", "never", "no", "neither", "nor"];

/// Contraction marker, matched anywhere ("isn't", "don't", "couldn't").
pub const NEGATION_CONTRACTION: &str = "n't";

pub const POSITIVE_WORDS: [&str; 6] = ["good", "great", "excellent", "amazing", "wonderful", "love"];

pub const NEGATIVE_WORDS: [&str; 6] = ["bad", "terrible", "awful", "horrible", "worst", "hate"];

/// Lexical indicators extracted from a single text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub has_negation: bool,
    pub has_positive: bool,
    pub has_negative: bool,
    pub has_mixed_sentiment: bool,
    pub word_count: usize,
}

/// Detect linguistic features in `text`.
///
/// Sentiment words and the "n't" contraction are matched as raw substrings of
/// the lower-cased text, so "love" also fires inside "lovely" and "bad" inside
/// "badge". The remaining negation words need a token of their own: "another"
/// and "nothing" carry no negation.
pub fn detect_linguistic_features(text: &str) -> FeatureSet {
    let text_lower = text.to_lowercase();

    let has_negation = text_lower.contains(NEGATION_CONTRACTION)
        || tokens(&text_lower).any(|token| NEGATION_WORDS.contains(&token));
    let has_positive = contains_any(&text_lower, &POSITIVE_WORDS);
    let has_negative = contains_any(&text_lower, &NEGATIVE_WORDS);

    FeatureSet {
        has_negation,
        has_positive,
        has_negative,
        has_mixed_sentiment: has_positive && has_negative,
        word_count: text.split_whitespace().count(),
    }
}

fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|word| haystack.contains(word))
}

/// Word tokens, split on anything that is neither alphanumeric nor an
/// apostrophe. Quoting apostrophes at the edges are stripped: "'no'" is "no".
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|token| token.trim_matches('\''))
        .filter(|token| !token.is_empty())
}
