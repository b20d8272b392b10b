use anyhow::{Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;

use newsletter_digest::domain::digest::Classification;
use newsletter_digest::llm::{CompletionRequest, LlmError, TextGenerator};
use newsletter_digest::mail::gmail::{GmailMessage, MailboxSession};
use newsletter_digest::pipeline::{DateRange, DigestPipeline, MailCollector, RunReport, RunRequest};

struct FakeGmail {
    ids: Vec<String>,
    messages: HashMap<String, GmailMessage>,
}

impl FakeGmail {
    fn new(messages: Vec<(&str, Option<&str>, &str, &str)>) -> Self {
        let mut ids = vec![];
        let mut map = HashMap::new();
        for (id, date, subject, body) in messages {
            let mut headers = vec![
                serde_json::json!({"name": "Subject", "value": subject}),
                serde_json::json!({"name": "From", "value": "News <news@example.com>"}),
            ];
            if let Some(d) = date {
                headers.push(serde_json::json!({"name": "Date", "value": d}));
            }
            let json = serde_json::json!({
                "id": id,
                "payload": {
                    "mimeType": "multipart/alternative",
                    "headers": headers,
                    "parts": [
                        {"mimeType": "text/plain", "body": {"data": URL_SAFE_NO_PAD.encode(body)}},
                        {"mimeType": "text/html", "body": {"data": URL_SAFE_NO_PAD.encode("<p>x</p>")}}
                    ]
                }
            });
            ids.push(id.to_string());
            map.insert(id.to_string(), serde_json::from_value(json).unwrap());
        }
        Self {
            ids,
            messages: map,
        }
    }
}

impl MailboxSession for FakeGmail {
    fn list_messages(&self, max_results: u32) -> Result<Vec<String>> {
        Ok(self.ids.iter().take(max_results as usize).cloned().collect())
    }

    fn get_message(&self, id: &str) -> Result<GmailMessage> {
        self.messages
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("404 {id}"))
    }
}

/// Says NO to anything mentioning an invoice, summarizes the rest, and answers
/// ranking prompts with a fixed digest.
#[derive(Default)]
struct FakeModel {
    calls: RefCell<Vec<CompletionRequest>>,
    fail: bool,
}

impl TextGenerator for FakeModel {
    fn generate(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.borrow_mut().push(request.clone());
        if self.fail {
            return Err(LlmError::Api {
                status: 429,
                message: "rate limited".into(),
            });
        }
        let system = &request.messages[0].content;
        let user = &request.messages[1].content;
        if system.contains("most important") {
            Ok("1. Rust: nueva version".to_string())
        } else if user.contains("invoice") {
            Ok("NO".to_string())
        } else {
            Ok("- novedad uno\n- novedad dos".to_string())
        }
    }
}

fn march(from: u32, to: u32) -> Option<DateRange> {
    DateRange::from_days(
        NaiveDate::from_ymd_opt(2024, 3, from).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, to).unwrap(),
    )
}

fn inbox() -> FakeGmail {
    FakeGmail::new(vec![
        (
            "a",
            Some("Tue, 05 Mar 2024 09:30:00 +0000"),
            "This Week in Rust",
            "Rust 1.77 released! Read more at https://blog.rust-lang.org",
        ),
        (
            "b",
            Some("Wed, 06 Mar 2024 10:00:00 +0000"),
            "Your invoice",
            "Your invoice for March is attached. Contact billing@example.com",
        ),
        ("c", None, "Undated", "no date header here"),
        (
            "d",
            Some("Mon, 01 Jan 2024 08:00:00 +0000"),
            "Old news",
            "happy new year",
        ),
    ])
}

#[test]
fn empty_range_skips_the_model() {
    let gmail = inbox();
    let model = FakeModel::default();
    let pipeline = DigestPipeline::new(&gmail, &model);

    let report = pipeline
        .run(&RunRequest {
            max_results: 10,
            range: march(20, 25),
        })
        .unwrap();

    assert_eq!(report, RunReport::NothingInRange { fetched: 4 });
    assert_eq!(report.notice(), Some("No emails found in the selected range."));
    assert!(model.calls.borrow().is_empty());
}

#[test]
fn full_run_classifies_each_email_and_ranks_once() {
    let gmail = inbox();
    let model = FakeModel::default();
    let pipeline = DigestPipeline::new(&gmail, &model);

    let report = pipeline
        .run(&RunRequest {
            max_results: 10,
            range: march(1, 10),
        })
        .unwrap();

    let RunReport::Completed { emails, digest } = report else {
        panic!("expected a completed run");
    };
    let subjects: Vec<_> = emails.iter().map(|e| e.subject.clone().unwrap()).collect();
    assert_eq!(subjects, ["This Week in Rust", "Your invoice"]);

    assert!(emails.records()[0].classification.as_ref().unwrap().is_newsletter());
    assert_eq!(
        emails.records()[1].classification,
        Some(Classification::Negative)
    );

    let digest = digest.unwrap();
    assert_eq!(digest.text, "1. Rust: nueva version");
    assert_eq!(digest.source_count, 1);

    let calls = model.calls.borrow();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2].messages[1].content, "- novedad uno | - novedad dos");
}

#[test]
fn cleaned_body_is_what_the_model_sees() {
    let gmail = inbox();
    let model = FakeModel::default();
    let pipeline = DigestPipeline::new(&gmail, &model);

    let request = RunRequest {
        max_results: 10,
        range: march(5, 6),
    };
    let collected = pipeline.collect(&request);
    let cleaned: Vec<_> = collected
        .iter()
        .map(|e| e.cleaned_body.clone().unwrap())
        .collect();
    assert!(cleaned.iter().all(|c| !c.contains('@') && !c.contains("http")));
    assert!(model.calls.borrow().is_empty());

    pipeline.run(&request).unwrap();
    let calls = model.calls.borrow();
    assert_eq!(calls[0].messages[1].content, cleaned[0]);
    assert_eq!(calls[1].messages[1].content, cleaned[1]);
}

#[test]
fn without_a_range_undated_mail_is_kept() {
    let gmail = inbox();
    let model = FakeModel::default();
    let pipeline = DigestPipeline::new(&gmail, &model);

    let emails = pipeline.collect(&RunRequest {
        max_results: 10,
        range: None,
    });
    assert_eq!(emails.len(), 4);

    let filtered = pipeline.collect(&RunRequest {
        max_results: 10,
        range: march(1, 31),
    });
    assert_eq!(filtered.len(), 2);
    assert!(filtered.iter().all(|e| e.date.is_some()));
}

#[test]
fn model_error_aborts_the_run() {
    let gmail = inbox();
    let model = FakeModel {
        fail: true,
        ..Default::default()
    };
    let pipeline = DigestPipeline::new(&gmail, &model);

    let err = pipeline
        .run(&RunRequest {
            max_results: 10,
            range: march(1, 10),
        })
        .unwrap_err();

    assert!(format!("{err:#}").contains("rate limited"));
    assert_eq!(model.calls.borrow().len(), 1);
}

#[test]
fn no_newsletters_means_no_digest() {
    let gmail = inbox();
    let model = FakeModel::default();
    let pipeline = DigestPipeline::new(&gmail, &model);

    let report = pipeline
        .run(&RunRequest {
            max_results: 10,
            range: march(6, 6),
        })
        .unwrap();

    let RunReport::Completed { emails, digest } = report else {
        panic!("expected a completed run");
    };
    assert_eq!(emails.len(), 1);
    assert_eq!(digest, None);
    assert_eq!(model.calls.borrow().len(), 1);
}

#[test]
fn collector_fetches_and_cleans_without_a_model() {
    let gmail = inbox();
    let emails = MailCollector::new(&gmail).collect(&RunRequest {
        max_results: 2,
        range: None,
    });

    assert_eq!(emails.len(), 2);
    let first = &emails.records()[0];
    assert_eq!(first.subject.as_deref(), Some("This Week in Rust"));
    assert_eq!(
        first.cleaned_body.as_deref(),
        Some("Rust 177 released Read more at")
    );
    assert_eq!(first.classification, None);
}
