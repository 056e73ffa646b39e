use crossterm::event::KeyCode;
use orchestrator::configs::Role;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::ui::{layout, theme::Theme, widgets};

use super::Action;

const LOGO: &str = r#"
 ___  ___  ___  ___  _  _  _____  ___  ___  ___  _  _
|   \| __|/ __|| __|| \| ||_   _|| _ \|_ _|| __|| || |
| |) | _|| (__ | _| | .` |  | |  |   / | | | _| \_. |
|___/|___|\___||___||_|\_|  |_|  |_|_\|___||_|   |_|

decentralized training dashboard
"#;

const MENU_ITEMS: &[&str] = &["Log in as trainer", "Log in as peer", "Quit"];

pub struct MenuState {
    pub selected: usize,
    /// Why we ended up back here, shown under the menu.
    pub notice: Option<String>,
}

impl MenuState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            notice: None,
        }
    }

    pub fn with_notice(notice: impl Into<String>) -> Self {
        Self {
            notice: Some(notice.into()),
            ..Self::new()
        }
    }
}

pub fn handle_key(state: &mut MenuState, key: KeyCode) -> Action {
    match key {
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected = state.selected.saturating_sub(1);
            Action::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.selected < MENU_ITEMS.len() - 1 {
                state.selected += 1;
            }
            Action::None
        }
        KeyCode::Char('t') => Action::Login(Role::Trainer),
        KeyCode::Char('p') => Action::Login(Role::Peer),
        KeyCode::Enter => match state.selected {
            0 => Action::Login(Role::Trainer),
            1 => Action::Login(Role::Peer),
            2 => Action::Quit,
            _ => Action::None,
        },
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}

pub fn draw(f: &mut Frame, state: &MenuState) {
    let area = f.size();
    f.render_widget(Block::default().style(Theme::base()), area);

    let outer = layout::centered_rect(70, 80, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Length(MENU_ITEMS.len() as u16 * 2 + 2),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(outer);

    draw_logo(f, chunks[0]);
    draw_menu(f, chunks[2], state);

    if let Some(notice) = &state.notice {
        f.render_widget(
            Paragraph::new(Span::styled(notice.as_str(), Theme::warn()))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[3],
        );
    }

    f.render_widget(
        widgets::hints(&[
            ("↑↓ / j k", "navigate"),
            ("enter", "select"),
            ("t / p", "trainer / peer"),
            ("q", "quit"),
        ]),
        chunks[5],
    );
}

fn draw_logo(f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = LOGO
        .lines()
        .map(|l| Line::from(Span::styled(l, Theme::title())))
        .collect();

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_menu(f: &mut Frame, area: Rect, state: &MenuState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .title(" MENU ")
        .title_alignment(Alignment::Center)
        .title_style(Theme::title());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let item_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            MENU_ITEMS
                .iter()
                .map(|_| Constraint::Length(2))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    for (i, (label, item_area)) in MENU_ITEMS.iter().zip(item_areas.iter()).enumerate() {
        let (prefix, style) = if i == state.selected {
            ("▶ ", Theme::title().add_modifier(Modifier::BOLD))
        } else {
            ("  ", Theme::dim())
        };

        let line = Line::from(vec![
            Span::styled(prefix, style),
            Span::styled(*label, style),
        ]);

        f.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), *item_area);
    }
}
