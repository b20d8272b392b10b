use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static RE_IMAGE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[image:[^\]]*\]").unwrap());
static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
/// Tokens that start with `http` or `www` at a word boundary. Mid-word hits such as
/// "awwwards" are left alone, so a glued "xhttp://" keeps its `http`.
static RE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:http|www)\S*").unwrap());
static RE_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Footers are only looked for in the last `MAX_FOOTER_LEN` bytes of the text.
const MAX_FOOTER_LEN: usize = 600;

/// Start-of-footer markers. Text is already ASCII, punctuation-free and single-spaced
/// when these run, so they are written against that shape.
const DEFAULT_BOILERPLATE: &[&str] = &[
    r"(?i)\bcopyright (c )?\d{4}\b",
    r"(?i)(\bc )?\b\d{4}\b.{0,80}\ball rights reserved\b",
    r"(?i)\ball rights reserved\b",
    r"(?i)\bsent from my (iphone|ipad|android|samsung|galaxy|mobile)\b",
    r"(?i)\bthis e ?mail was sent to\b",
    r"(?i)\byou (are|re) receiving this (e ?mail|message|newsletter)\b",
    r"(?i)\bif you no longer wish to receive\b",
    r"(?i)\bthis (e ?mail|message) and any attachments (is|are|may be)\b",
];

/// Normalizes decoded bodies into plain single-spaced ASCII for the model.
#[derive(Debug, Clone)]
pub struct ContentCleaner {
    boilerplate: Vec<Regex>,
}

impl Default for ContentCleaner {
    fn default() -> Self {
        Self::with_extra_patterns(&[])
    }
}

impl ContentCleaner {
    /// Defaults plus user patterns; patterns that don't compile are logged and skipped.
    pub fn with_extra_patterns(extra: &[String]) -> Self {
        let boilerplate = DEFAULT_BOILERPLATE
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("ignoring boilerplate pattern {p:?}: {e}");
                    None
                }
            })
            .collect();
        Self { boilerplate }
    }

    /// The order of the steps matters: punctuation goes before the ASCII fold, and the
    /// footer strip sees single-spaced text.
    pub fn clean(&self, text: &str) -> String {
        let t = RE_IMAGE_PLACEHOLDER.replace_all(text, "");
        let t = RE_EMAIL.replace_all(&t, "");
        let t = RE_URL.replace_all(&t, "");
        let t = RE_NON_WORD.replace_all(&t, "");
        let t: String = t.nfd().filter(char::is_ascii).collect();
        let t = RE_WHITESPACE.replace_all(&t, " ");
        self.strip_boilerplate(t.trim()).to_string()
    }

    /// Cut from the earliest footer marker in the tail through end of text.
    fn strip_boilerplate<'t>(&self, text: &'t str) -> &'t str {
        let mut floor = text.len().saturating_sub(MAX_FOOTER_LEN);
        while !text.is_char_boundary(floor) {
            floor += 1;
        }
        let cut = self
            .boilerplate
            .iter()
            .filter_map(|re| re.find_at(text, floor).map(|m| m.start()))
            .min();
        match cut {
            Some(at) => text[..at].trim_end(),
            None => text,
        }
    }
}

pub fn clean_text(text: &str) -> String {
    static DEFAULT: LazyLock<ContentCleaner> = LazyLock::new(ContentCleaner::default);
    DEFAULT.clean(text)
}
