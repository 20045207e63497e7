//! Text normalization. The step order is fixed: each step runs on the output
//! of the previous one, and the result is a fixed point (`clean(clean(x)) == clean(x)`).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Common English function words dropped from cleaned text.
pub const STOP_WORDS: &[&str] = &[
    "the", "is", "in", "and", "to", "with", "a", "an", "of", "for", "on", "at", "by", "this",
    "that", "are", "was", "it", "be", "as", "from", "or", "has", "have", "had", "but", "not",
    "he", "she", "they", "you", "we", "his", "her",
];

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)http\S+").unwrap());
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\S+").unwrap());
static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\S+").unwrap());
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]").unwrap());
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{2600}-\x{26FF}\x{2700}-\x{27BF}]+").unwrap());
static RT_CC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"RT|CC").unwrap());

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word.to_lowercase().as_str())
}

/// Normalizes extracted resume text for classification and prompting.
/// May return an empty string; callers treat that as empty content.
pub fn clean(text: &str) -> String {
    let text = URL.replace_all(text, " ");
    let text = MENTION.replace_all(&text, " ");
    let text = HASHTAG.replace_all(&text, " ");
    let text = LINE_BREAK.replace_all(&text, " ");
    let text = NON_WORD.replace_all(&text, " ");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    let text = SYMBOLS.replace_all(text.trim(), " ");
    let text = RT_CC.replace_all(&text, "");
    let text = text.to_lowercase();

    text.split_whitespace()
        .filter(|word| !is_stop_word(word) && !is_url_fragment(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A token that step 1 would strip on a second pass. RT/CC removal can glue
/// fragments such as `hRTttps` back into a URL prefix.
fn is_url_fragment(word: &str) -> bool {
    URL.is_match(word)
}
