use chrono::{Days, NaiveDate};
use ratatui::widgets::TableState;

use crate::domain::email::EmailRecord;
use crate::pipeline::{DateRange, NOTHING_IN_RANGE, RunReport, RunRequest};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const MAX_RESULTS_LIMIT: u32 = 500;
const DATE_INPUT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    From,
    To,
    Count,
    Results,
    Digest,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::From,
        Focus::To,
        Focus::Count,
        Focus::Results,
        Focus::Digest,
    ];

    fn step(self, delta: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(idx + delta).rem_euclid(len) as usize]
    }

    pub fn is_date_input(self) -> bool {
        matches!(self, Focus::From | Focus::To)
    }
}

#[derive(Debug)]
pub struct AppState {
    pub from_input: String,
    pub to_input: String,
    pub max_results: u32,
    pub focus: Focus,

    pub rows: Vec<EmailRecord>,
    pub table_state: TableState,
    pub digest: Option<String>,
    pub digest_scroll: u16,

    pub status: String,
}

impl AppState {
    /// Range defaults to the last seven days ending `today`.
    pub fn new(max_results: u32, today: NaiveDate) -> Self {
        let week_ago = today.checked_sub_days(Days::new(7)).unwrap_or(today);
        Self {
            from_input: week_ago.format(DATE_FORMAT).to_string(),
            to_input: today.format(DATE_FORMAT).to_string(),
            max_results: max_results.clamp(1, MAX_RESULTS_LIMIT),
            focus: Focus::From,
            rows: vec![],
            table_state: TableState::default(),
            digest: None,
            digest_scroll: 0,
            status: "Press Enter to fetch.".to_string(),
        }
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.step(1);
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.step(-1);
    }

    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::From => Some(&mut self.from_input),
            Focus::To => Some(&mut self.to_input),
            _ => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if !(c.is_ascii_digit() || c == '-') {
            return;
        }
        if let Some(input) = self.focused_input()
            && input.len() < DATE_INPUT_LEN
        {
            input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(input) = self.focused_input() {
            input.pop();
        }
    }

    pub fn adjust_count(&mut self, delta: i64) {
        let next = (self.max_results as i64 + delta).clamp(1, MAX_RESULTS_LIMIT as i64);
        self.max_results = next as u32;
    }

    pub fn request(&self) -> Result<RunRequest, String> {
        let parse = |label: &str, s: &str| {
            NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map_err(|_| format!("{label} date must look like 2024-03-01"))
        };
        let from = parse("Start", &self.from_input)?;
        let to = parse("End", &self.to_input)?;
        if from > to {
            return Err("Start date is after end date.".to_string());
        }
        let range =
            DateRange::from_days(from, to).ok_or_else(|| "Invalid date range.".to_string())?;
        Ok(RunRequest {
            max_results: self.max_results,
            range: Some(range),
        })
    }

    pub fn apply_report(&mut self, report: RunReport) {
        self.digest_scroll = 0;
        match report {
            RunReport::NothingInRange { fetched } => {
                self.rows.clear();
                self.digest = None;
                self.status = format!("{NOTHING_IN_RANGE} ({fetched} fetched)");
            }
            RunReport::Completed { emails, digest } => {
                let newsletters = emails
                    .iter()
                    .filter(|r| r.classification.as_ref().is_some_and(|c| c.is_newsletter()))
                    .count();
                self.status = format!(
                    "{} emails, {newsletters} newsletters.",
                    emails.len()
                );
                self.rows = emails.into_iter().collect();
                self.digest = Some(
                    digest
                        .map(|d| d.text)
                        .unwrap_or_else(|| "No newsletters in this range.".to_string()),
                );
            }
        }
        self.table_state
            .select(if self.rows.is_empty() { None } else { Some(0) });
    }

    pub fn apply_error(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    pub fn move_selection(&mut self, delta: i64) {
        if self.rows.is_empty() {
            self.table_state.select(None);
            return;
        }
        let cur = self.table_state.selected().unwrap_or(0) as i64;
        let last = self.rows.len() as i64 - 1;
        self.table_state
            .select(Some((cur + delta).clamp(0, last) as usize));
    }

    pub fn scroll_digest(&mut self, delta: i32) {
        if delta < 0 {
            self.digest_scroll = self.digest_scroll.saturating_sub(delta.unsigned_abs() as u16);
        } else {
            self.digest_scroll = self.digest_scroll.saturating_add(delta as u16);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digest::{Classification, Digest};
    use crate::domain::email::EmailCollection;

    fn state() -> AppState {
        AppState::new(25, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    #[test]
    fn defaults_to_last_week() {
        let s = state();
        assert_eq!(s.from_input, "2024-03-03");
        assert_eq!(s.to_input, "2024-03-10");
        let req = s.request().unwrap();
        assert_eq!(req.max_results, 25);
        assert_eq!(
            req.range.unwrap().start.to_rfc3339(),
            "2024-03-03T00:00:00+00:00"
        );
    }

    #[test]
    fn focus_cycles_both_ways() {
        let mut s = state();
        s.prev_focus();
        assert_eq!(s.focus, Focus::Digest);
        s.next_focus();
        s.next_focus();
        assert_eq!(s.focus, Focus::To);
    }

    #[test]
    fn editing_only_touches_focused_date() {
        let mut s = state();
        s.next_focus();
        for _ in 0..2 {
            s.backspace();
        }
        s.input_char('x');
        s.input_char('0');
        s.input_char('9');
        assert_eq!(s.to_input, "2024-03-09");
        assert_eq!(s.from_input, "2024-03-03");

        s.focus = Focus::Count;
        s.input_char('7');
        assert_eq!(s.max_results, 25);
    }

    #[test]
    fn count_is_clamped() {
        let mut s = state();
        s.adjust_count(-100);
        assert_eq!(s.max_results, 1);
        s.adjust_count(10_000);
        assert_eq!(s.max_results, MAX_RESULTS_LIMIT);
    }

    #[test]
    fn bad_dates_are_reported() {
        let mut s = state();
        s.from_input = "03/01/2024".into();
        assert!(s.request().unwrap_err().contains("Start date"));

        s.from_input = "2024-03-11".into();
        assert_eq!(s.request().unwrap_err(), "Start date is after end date.");
    }

    #[test]
    fn empty_range_shows_notice_not_table() {
        let mut s = state();
        s.rows = vec![EmailRecord::default()];
        s.apply_report(RunReport::NothingInRange { fetched: 4 });
        assert!(s.rows.is_empty());
        assert_eq!(s.table_state.selected(), None);
        assert_eq!(s.status, "No emails found in the selected range. (4 fetched)");
    }

    #[test]
    fn completed_report_fills_table_and_digest() {
        let mut s = state();
        let emails = EmailCollection::new(vec![
            EmailRecord {
                classification: Some(Classification::Negative),
                ..Default::default()
            },
            EmailRecord {
                classification: Some(Classification::from_response("- a")),
                ..Default::default()
            },
        ]);
        s.apply_report(RunReport::Completed {
            emails,
            digest: Some(Digest {
                text: "1. a".into(),
                source_count: 1,
            }),
        });
        assert_eq!(s.rows.len(), 2);
        assert_eq!(s.table_state.selected(), Some(0));
        assert_eq!(s.digest.as_deref(), Some("1. a"));
        assert_eq!(s.status, "2 emails, 1 newsletters.");

        s.move_selection(5);
        assert_eq!(s.table_state.selected(), Some(1));
        s.scroll_digest(-3);
        assert_eq!(s.digest_scroll, 0);
    }
}
