// src/text.rs
//! Text normalization for snippets, claims and page text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound for any normalized text we forward to collaborators.
pub const MAX_TEXT_CHARS: usize = 1500;

/// Upper bound for a search query.
pub const MAX_QUERY_CHARS: usize = 300;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Decode HTML entities, strip tags, ASCII-fy curly quotes, collapse whitespace,
/// cap at `MAX_TEXT_CHARS`.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    out = RE_TAGS.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    out = RE_WS.replace_all(&out, " ").trim().to_string();

    truncate_chars(&out, MAX_TEXT_CHARS)
}

/// Words that end in a period without ending the sentence.
const ABBREVIATIONS: &[&str] = &["mr", "mrs", "ms", "dr", "st", "jr", "sr", "vs", "no", "etc"];

/// Derive the search query for a claim. For page text only the first sentence is
/// used; a page given as a bare URL is searched whole.
pub fn search_query(claim: &str, is_page: bool) -> String {
    let text = normalize_text(claim);
    let query = if is_page && !is_web_url(&text) {
        first_sentence(&text)
    } else {
        text.as_str()
    };
    truncate_chars(query.trim(), MAX_QUERY_CHARS)
}

fn is_web_url(s: &str) -> bool {
    !s.contains(char::is_whitespace)
        && reqwest::Url::parse(s).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Text up to the first `.`, `!` or `?` followed by whitespace or end of input.
/// Periods closing an initialism ("U.S.") or a common abbreviation do not count.
fn first_sentence(s: &str) -> &str {
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_break = chars.peek().map_or(true, |&(_, n)| n.is_whitespace());
        if !at_break || i == 0 {
            continue;
        }
        if c == '.' && is_abbreviation(last_word(&s[..i])) {
            continue;
        }
        return &s[..i];
    }
    s
}

fn last_word(s: &str) -> &str {
    s.rsplit(char::is_whitespace).next().unwrap_or(s)
}

fn is_abbreviation(word: &str) -> bool {
    let single_letter = word.chars().count() == 1 && word.chars().all(char::is_alphabetic);
    single_letter
        || word.contains('.')
        || ABBREVIATIONS.contains(&word.to_ascii_lowercase().as_str())
}

/// Char-boundary-safe prefix of at most `max` chars.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
