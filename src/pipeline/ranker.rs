use regex::Regex;
use std::sync::LazyLock;

use crate::domain::digest::{Classification, Digest};
use crate::llm::{CompletionRequest, LlmError, TextGenerator};

pub const SEPARATOR: &str = " | ";

static RE_NEGATIVE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bNO\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSettings {
    pub top_n: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            top_n: 10,
            max_tokens: 1500,
            temperature: 1.0,
        }
    }
}

pub fn ranking_prompt(top_n: usize) -> String {
    format!(
        "Below are highlights extracted from several newsletters, separated by \"{}\". \
         Select the {top_n} most important items, summarize each one in one or two sentences \
         and translate them to Spanish. Answer only with a numbered list from 1 to {top_n}, \
         one item per line, in the format: \"1. <title>: <summary>\".",
        SEPARATOR.trim()
    )
}

/// Flatten every newsletter summary into one line. `None` when there are none.
pub fn rank_payload(classifications: &[Classification]) -> Option<String> {
    let summaries: Vec<&str> = classifications
        .iter()
        .filter_map(Classification::summary)
        .collect();
    if summaries.is_empty() {
        return None;
    }
    let joined = summaries.join(SEPARATOR);
    let stripped = RE_NEGATIVE_TOKEN.replace_all(&joined, "");
    Some(stripped.replace('\n', SEPARATOR))
}

/// One ranking call over every newsletter summary. The model is not called when
/// nothing was classified as a newsletter.
pub fn rank(
    generator: &dyn TextGenerator,
    classifications: &[Classification],
    settings: RankSettings,
) -> Result<Option<Digest>, LlmError> {
    let Some(payload) = rank_payload(classifications) else {
        log::info!("no newsletters to rank");
        return Ok(None);
    };
    let source_count = classifications.iter().filter(|c| c.is_newsletter()).count();
    log::info!("ranking {source_count} newsletter summaries");

    let request = CompletionRequest::with_system(
        ranking_prompt(settings.top_n),
        payload,
        settings.max_tokens,
        settings.temperature,
    );
    let text = generator.generate(&request)?;
    Ok(Some(Digest { text, source_count }))
}
