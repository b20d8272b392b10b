use serde::Serialize;

/// Literal the classifier answers with when an email is not a newsletter.
pub const NEGATIVE_TOKEN: &str = "NO";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Negative,
    Newsletter { summary: String },
}

impl Classification {
    /// Exact match on the trimmed response; anything else is a summary.
    pub fn from_response(response: &str) -> Self {
        let trimmed = response.trim();
        if trimmed == NEGATIVE_TOKEN {
            Self::Negative
        } else {
            Self::Newsletter {
                summary: trimmed.to_string(),
            }
        }
    }

    pub fn is_newsletter(&self) -> bool {
        matches!(self, Self::Newsletter { .. })
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::Negative => None,
            Self::Newsletter { summary } => Some(summary),
        }
    }

    /// The raw per-record text: the negative token or the bullet summary.
    pub fn as_text(&self) -> &str {
        self.summary().unwrap_or(NEGATIVE_TOKEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub text: String,
    /// How many newsletter summaries went into the ranking prompt.
    pub source_count: usize,
}
