use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};

use crate::domain::email::EmailRecord;
use crate::mail::gmail::{GmailMessage, Header};

/// Gmail emits base64url both with and without trailing `=`.
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("message {0} has no payload")]
    MissingPayload(String),
    #[error("invalid base64url body: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// First header with exactly this name.
fn header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let epoch = mailparse::dateparse(raw)
        .map_err(|e| log::debug!("unparsable Date header {raw:?}: {e}"))
        .ok()?;
    DateTime::from_timestamp(epoch, 0)
}

pub fn decode_body_data(data: &str) -> Result<String, DecodeError> {
    let bytes = BASE64URL.decode(data)?;
    Ok(String::from_utf8(bytes)?)
}

/// Decode one Gmail message into a record. Only the first top-level text/plain part
/// contributes to the body.
pub fn decode_message(message: &GmailMessage) -> Result<EmailRecord, DecodeError> {
    let payload = message
        .payload
        .as_ref()
        .ok_or_else(|| DecodeError::MissingPayload(message.id.clone()))?;

    let headers = &payload.headers;
    let date = header(headers, "Date").and_then(parse_date);
    let sender = header(headers, "From").map(str::to_string);
    let subject = header(headers, "Subject").map(str::to_string);

    let body = match payload.parts.iter().find(|p| p.mime_type == "text/plain") {
        Some(part) => {
            let data = part
                .body
                .as_ref()
                .and_then(|b| b.data.as_deref())
                .unwrap_or_default();
            decode_body_data(data)?
        }
        None => String::new(),
    };

    Ok(EmailRecord {
        date,
        sender,
        subject,
        body,
        ..Default::default()
    })
}
