pub mod events;
pub mod state;
pub mod ui;

use color_eyre::eyre::Result;
use ratatui::{
    DefaultTerminal,
    crossterm::event::{self, Event, KeyEventKind},
};

use crate::pipeline::{RunReport, RunRequest};
use events::{Action, handle_key};
use state::AppState;

/// Interactive control panel. `runner` executes one pipeline run per fetch.
pub fn run_tui<F>(initial: AppState, runner: F) -> Result<()>
where
    F: FnMut(&RunRequest) -> anyhow::Result<RunReport>,
{
    color_eyre::install()?;

    let terminal = ratatui::init();
    let result = run(terminal, initial, runner);

    ratatui::restore();

    result
}

fn run<F>(mut terminal: DefaultTerminal, mut state: AppState, mut runner: F) -> Result<()>
where
    F: FnMut(&RunRequest) -> anyhow::Result<RunReport>,
{
    loop {
        terminal.draw(|f| ui::render(f, &mut state))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_key(key, &mut state) {
            Action::Quit => break,
            Action::None => {}
            Action::Fetch => {
                let request = match state.request() {
                    Ok(r) => r,
                    Err(msg) => {
                        state.apply_error(msg);
                        continue;
                    }
                };
                state.status = "Fetching and classifying…".to_string();
                terminal.draw(|f| ui::render(f, &mut state))?;

                match runner(&request) {
                    Ok(report) => state.apply_report(report),
                    Err(e) => {
                        log::error!("pipeline run failed: {e:#}");
                        state.apply_error(format!("Error: {e:#}"));
                    }
                }
            }
        }
    }
    Ok(())
}
