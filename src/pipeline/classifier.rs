use crate::domain::digest::{Classification, NEGATIVE_TOKEN};
use crate::llm::{CompletionRequest, LlmError, TextGenerator};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifySettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 1.0,
        }
    }
}

pub fn system_prompt() -> String {
    format!(
        "You will receive the plain text of an email. \
         If it is not a newsletter (a recurring bulk-content digest sent to many subscribers), \
         answer with exactly {NEGATIVE_TOKEN} and nothing else. \
         If it is a newsletter, translate its content to Spanish and extract its most relevant \
         highlights as a list, one highlight per line, each line starting with \"- \"."
    )
}

/// One model call per email. The response is taken as-is apart from the exact
/// negative-token check.
pub fn classify(
    generator: &dyn TextGenerator,
    cleaned_body: &str,
    settings: ClassifySettings,
) -> Result<Classification, LlmError> {
    let request = CompletionRequest::with_system(
        system_prompt(),
        cleaned_body,
        settings.max_tokens,
        settings.temperature,
    );
    let response = generator.generate(&request)?;
    Ok(Classification::from_response(&response))
}
