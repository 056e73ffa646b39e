use api::HttpBackend;
use crossterm::event::KeyCode;
use orchestrator::Dashboard;
use ratatui::{
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

use crate::{
    app::Ctx,
    ui::{layout, theme::Theme, widgets},
};

use super::{monitor::MonitorState, Action, Screen};

pub struct AnalysisState {
    pub scroll: u16,
}

impl AnalysisState {
    pub fn new() -> Self {
        Self { scroll: 0 }
    }
}

pub fn handle_key(state: &mut AnalysisState, key: KeyCode, _ctx: &mut Ctx) -> Action {
    match key {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('b') | KeyCode::Esc => Action::Transition(Screen::Monitor(MonitorState::new())),
        KeyCode::Up | KeyCode::Char('k') => {
            state.scroll = state.scroll.saturating_sub(1);
            Action::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.scroll = state.scroll.saturating_add(1);
            Action::None
        }
        KeyCode::PageUp => {
            state.scroll = state.scroll.saturating_sub(10);
            Action::None
        }
        KeyCode::PageDown => {
            state.scroll = state.scroll.saturating_add(10);
            Action::None
        }
        _ => Action::None,
    }
}

pub fn draw(f: &mut Frame, state: &AnalysisState, dashboard: &Dashboard<HttpBackend>) {
    let view = dashboard.view();
    let area = f.size();
    f.render_widget(Block::default().style(Theme::base()), area);

    let (header, body, status, hints) = layout::vertical(area);
    f.render_widget(widgets::header(view), header);

    let lines = match &view.analysis {
        Some(text) => render(text),
        None => vec![Line::from(Span::styled("no analysis yet", Theme::muted()))],
    };

    f.render_widget(
        Paragraph::new(lines)
            .block(widgets::panel("Analysis"))
            .wrap(Wrap { trim: false })
            .scroll((state.scroll, 0)),
        body,
    );

    f.render_widget(widgets::status_line(view.error.as_deref(), None), status);
    f.render_widget(
        widgets::hints(&[("↑↓ / pgup pgdn", "scroll"), ("b", "back"), ("q", "quit")]),
        hints,
    );
}

/// Turns the backend's lightweight markup into styled lines.
///
/// `#` headers, `*` and `-` bullets and `**bold**` runs are understood,
/// everything else is shown as is.
fn render(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();

            if trimmed.starts_with('#') {
                let title = trimmed.trim_start_matches('#').trim();
                return Line::from(Span::styled(title.to_string(), Theme::title()));
            }

            let bullet = trimmed
                .strip_prefix("* ")
                .or_else(|| trimmed.strip_prefix("- "));

            match bullet {
                Some(rest) => {
                    let mut spans = vec![Span::styled("  • ", Theme::title())];
                    spans.extend(inline(rest));
                    Line::from(spans)
                }
                None => Line::from(inline(line)),
            }
        })
        .collect()
}

fn inline(text: &str) -> Vec<Span<'static>> {
    let parts: Vec<&str> = text.split("**").collect();
    // an even count means the last marker was never closed
    let closed = parts.len() % 2 == 1;

    let mut spans = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let last = i == parts.len() - 1;
        if i % 2 == 1 && (closed || !last) {
            spans.push(Span::styled(part.to_string(), Theme::bold()));
        } else if i % 2 == 1 {
            spans.push(Span::styled(format!("**{part}"), Theme::text()));
        } else if !part.is_empty() {
            spans.push(Span::styled(part.to_string(), Theme::text()));
        }
    }

    spans
}
