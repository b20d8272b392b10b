use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

use crate::domain::email::EmailRecord;
use crate::terminal::state::{AppState, Focus};

const DATE_COLUMN: &str = "%Y-%m-%d %H:%M";

fn border(state: &AppState, focus: Focus) -> Style {
    if state.focus == focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn render(f: &mut Frame, state: &mut AppState) {
    let [form, body, status, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_form(f, state, form);

    let [table_area, digest_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(body);
    render_table(f, state, table_area);
    render_digest(f, state, digest_area);

    f.render_widget(
        Paragraph::new(state.status.as_str()).style(Style::default().fg(Color::Cyan)),
        status,
    );

    let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::BOLD));
    let hint = Paragraph::new(Line::from(vec![
        key("Tab"),
        Span::raw(" focus  "),
        key("Enter"),
        Span::raw(" fetch  "),
        key("j/k"),
        Span::raw(" move  "),
        key("+/-"),
        Span::raw(" count  "),
        key("Esc"),
        Span::raw(" quit"),
    ]));
    f.render_widget(hint, footer);
}

fn render_form(f: &mut Frame, state: &AppState, area: Rect) {
    let [from, to, count] = Layout::horizontal([
        Constraint::Length(18),
        Constraint::Length(18),
        Constraint::Length(14),
    ])
    .areas(area);

    let field = |title: &'static str, value: String, focus: Focus| {
        Paragraph::new(value).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border(state, focus)),
        )
    };

    f.render_widget(field(" From ", state.from_input.clone(), Focus::From), from);
    f.render_widget(field(" To ", state.to_input.clone(), Focus::To), to);
    f.render_widget(
        field(" Count ", state.max_results.to_string(), Focus::Count),
        count,
    );
}

fn row(e: &EmailRecord) -> Row<'static> {
    let date = e
        .date
        .map(|d| d.format(DATE_COLUMN).to_string())
        .unwrap_or_default();
    let kind = match &e.classification {
        Some(c) if c.is_newsletter() => Cell::from("Newsletter").style(Style::default().fg(Color::Green)),
        Some(_) => Cell::from("No").style(Style::default().fg(Color::Gray)),
        None => Cell::from(""),
    };
    Row::new(vec![
        Cell::from(date),
        Cell::from(e.sender.clone().unwrap_or_default()),
        Cell::from(e.subject.clone().unwrap_or_default()),
        kind,
    ])
}

fn render_table(f: &mut Frame, state: &mut AppState, area: Rect) {
    let header = Row::new(vec!["Date", "From", "Subject", "Class"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table = Table::new(
        state.rows.iter().map(row),
        [
            Constraint::Length(16),
            Constraint::Percentage(30),
            Constraint::Fill(1),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!(" Emails ({}) ", state.rows.len()))
            .borders(Borders::ALL)
            .border_style(border(state, Focus::Results)),
    )
    .row_highlight_style(Style::default().fg(Color::Green))
    .highlight_symbol("➜ ");

    f.render_stateful_widget(table, area, &mut state.table_state);
}

fn render_digest(f: &mut Frame, state: &AppState, area: Rect) {
    let text = state
        .digest
        .clone()
        .unwrap_or_else(|| "Pick a date range and press Enter.".to_string());

    let p = Paragraph::new(text)
        .block(
            Block::default()
                .title(" Digest ")
                .borders(Borders::ALL)
                .border_style(border(state, Focus::Digest)),
        )
        .wrap(Wrap { trim: false })
        .scroll((state.digest_scroll, 0));

    f.render_widget(p, area);
}
