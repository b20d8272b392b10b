use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::digest::Classification;

/// One decoded message. Column names follow the exported table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmailRecord {
    #[serde(rename = "fecha")]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "correo")]
    pub sender: Option<String>,
    #[serde(rename = "titulo")]
    pub subject: Option<String>,
    #[serde(rename = "contenido")]
    pub body: String,

    #[serde(rename = "contenido_limpio", skip_serializing_if = "Option::is_none")]
    pub cleaned_body: Option<String>,
    #[serde(rename = "clasificacion", skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl EmailRecord {
    /// Inclusive on both ends; undated records never match.
    pub fn is_within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.date.is_some_and(|d| start <= d && d <= end)
    }
}

/// Records in mailbox listing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailCollection {
    records: Vec<EmailRecord>,
}

impl EmailCollection {
    pub fn new(records: Vec<EmailRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: EmailRecord) {
        self.records.push(record);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmailRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, EmailRecord> {
        self.records.iter_mut()
    }

    pub fn records(&self) -> &[EmailRecord] {
        &self.records
    }

    pub fn filter_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| r.is_within(start, end))
                .cloned()
                .collect(),
        }
    }
}

impl From<Vec<EmailRecord>> for EmailCollection {
    fn from(records: Vec<EmailRecord>) -> Self {
        Self::new(records)
    }
}

impl IntoIterator for EmailCollection {
    type Item = EmailRecord;
    type IntoIter = std::vec::IntoIter<EmailRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a EmailCollection {
    type Item = &'a EmailRecord;
    type IntoIter = std::slice::Iter<'a, EmailRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
