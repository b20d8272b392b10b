pub mod classifier;
pub mod cleaner;
pub mod ranker;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::config::Config;
use crate::domain::digest::Digest;
use crate::domain::email::EmailCollection;
use crate::llm::TextGenerator;
use crate::mail::fetcher::fetch_emails;
use crate::mail::gmail::MailboxSession;
use classifier::{ClassifySettings, classify};
use cleaner::ContentCleaner;
use ranker::{RankSettings, rank};

pub const NOTHING_IN_RANGE: &str = "No emails found in the selected range.";

/// Inclusive UTC bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// From the first second of `from` through the last second of `to`.
    pub fn from_days(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        let start = from.and_hms_opt(0, 0, 0)?.and_utc();
        let end = to.and_hms_opt(23, 59, 59)?.and_utc();
        Some(Self { start, end })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRequest {
    pub max_results: u32,
    pub range: Option<DateRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    /// The date filter left nothing; no model call was made.
    NothingInRange { fetched: usize },
    Completed {
        emails: EmailCollection,
        /// `None` when no email was judged a newsletter.
        digest: Option<Digest>,
    },
}

impl RunReport {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::NothingInRange { .. } => Some(NOTHING_IN_RANGE),
            Self::Completed { .. } => None,
        }
    }
}

/// Fetch, date filter and clean. Never calls the model.
pub struct MailCollector<'a> {
    session: &'a dyn MailboxSession,
    cleaner: ContentCleaner,
}

impl<'a> MailCollector<'a> {
    pub fn new(session: &'a dyn MailboxSession) -> Self {
        Self {
            session,
            cleaner: ContentCleaner::default(),
        }
    }

    pub fn from_config(cfg: &Config, session: &'a dyn MailboxSession) -> Self {
        Self::new(session).with_cleaner(ContentCleaner::with_extra_patterns(
            &cfg.cleaner.boilerplate_patterns,
        ))
    }

    pub fn with_cleaner(mut self, cleaner: ContentCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn collect(&self, request: &RunRequest) -> EmailCollection {
        self.collect_counted(request).1
    }

    /// Like [`Self::collect`], also returning how many emails were fetched before filtering.
    fn collect_counted(&self, request: &RunRequest) -> (usize, EmailCollection) {
        let fetched = fetch_emails(self.session, request.max_results);
        let fetched_count = fetched.len();
        let mut emails = match request.range {
            Some(r) => {
                let kept = fetched.filter_by_date_range(r.start, r.end);
                log::info!(
                    "{} of {} emails fall in {} .. {}",
                    kept.len(),
                    fetched.len(),
                    r.start,
                    r.end
                );
                kept
            }
            None => fetched,
        };
        for record in emails.iter_mut() {
            record.cleaned_body = Some(self.cleaner.clean(&record.body));
        }
        (fetched_count, emails)
    }
}

pub struct DigestPipeline<'a> {
    collector: MailCollector<'a>,
    generator: &'a dyn TextGenerator,
    classify: ClassifySettings,
    rank: RankSettings,
}

impl<'a> DigestPipeline<'a> {
    pub fn new(session: &'a dyn MailboxSession, generator: &'a dyn TextGenerator) -> Self {
        Self {
            collector: MailCollector::new(session),
            generator,
            classify: ClassifySettings::default(),
            rank: RankSettings::default(),
        }
    }

    pub fn from_config(
        cfg: &Config,
        session: &'a dyn MailboxSession,
        generator: &'a dyn TextGenerator,
    ) -> Self {
        Self {
            collector: MailCollector::from_config(cfg, session),
            generator,
            classify: ClassifySettings {
                max_tokens: cfg.llm.classify_max_tokens,
                temperature: cfg.llm.classify_temperature,
            },
            rank: RankSettings {
                top_n: cfg.llm.top_n,
                max_tokens: cfg.llm.rank_max_tokens,
                temperature: cfg.llm.rank_temperature,
            },
        }
    }

    pub fn with_cleaner(mut self, cleaner: ContentCleaner) -> Self {
        self.collector = self.collector.with_cleaner(cleaner);
        self
    }

    pub fn with_classify_settings(mut self, settings: ClassifySettings) -> Self {
        self.classify = settings;
        self
    }

    pub fn with_rank_settings(mut self, settings: RankSettings) -> Self {
        self.rank = settings;
        self
    }

    pub fn collect(&self, request: &RunRequest) -> EmailCollection {
        self.collector.collect(request)
    }

    pub fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let (fetched, mut emails) = self.collector.collect_counted(request);
        if emails.is_empty() {
            log::info!("{NOTHING_IN_RANGE}");
            return Ok(RunReport::NothingInRange { fetched });
        }

        let total = emails.len();
        let mut classifications = Vec::with_capacity(total);
        for (i, record) in emails.iter_mut().enumerate() {
            let text = record.cleaned_body.as_deref().unwrap_or_default();
            let c = classify(self.generator, text, self.classify).with_context(|| {
                format!(
                    "classifying email {}/{total} ({})",
                    i + 1,
                    record.subject.as_deref().unwrap_or("no subject")
                )
            })?;
            log::info!(
                "email {}/{total}: {}",
                i + 1,
                if c.is_newsletter() { "newsletter" } else { "not a newsletter" }
            );
            record.classification = Some(c.clone());
            classifications.push(c);
        }

        let digest = rank(self.generator, &classifications, self.rank)
            .context("ranking newsletter summaries")?;
        Ok(RunReport::Completed { emails, digest })
    }
}
