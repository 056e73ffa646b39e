use api::{types::Ownership, HttpBackend};
use crossterm::event::KeyCode;
use log::warn;
use orchestrator::{
    configs::Role, metrics, Dashboard, DashboardError, IdleView, Joined, Phase,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Cell, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

use crate::{
    app::Ctx,
    ui::{layout, theme::Theme, widgets},
};

use super::{
    create::{self, CreateForm, FormOutcome},
    monitor::MonitorState,
    Action, Screen,
};

/// The online/offline console: session list, new-session form and, for
/// peers, the uptime counter.
pub struct NetworkState {
    pub selected: usize,
    pub form: CreateForm,
    pub notice: Option<String>,
}

impl NetworkState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            form: CreateForm::new(),
            notice: None,
        }
    }
}

pub fn handle_key(state: &mut NetworkState, key: KeyCode, ctx: &mut Ctx) -> Action {
    if ctx.dashboard.view().phase == Phase::Idle(IdleView::Create) {
        return handle_form(state, key, ctx);
    }

    state.notice = None;

    match key {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => Action::Logout,
        KeyCode::Char('x') => {
            ctx.dashboard.dismiss_error();
            Action::None
        }
        KeyCode::Char('o') => {
            toggle_online(state, ctx);
            Action::None
        }
        KeyCode::Char('r') => {
            let res = ctx.runtime.block_on(ctx.dashboard.show_sessions());
            report(state, res);
            Action::None
        }
        KeyCode::Char('n') | KeyCode::Tab => {
            let res = ctx.dashboard.show_create();
            report(state, res);
            Action::None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected = state.selected.saturating_sub(1);
            Action::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let len = ctx.dashboard.view().sessions.len();
            if state.selected + 1 < len {
                state.selected += 1;
            }
            Action::None
        }
        KeyCode::Enter => {
            let session_id = ctx
                .dashboard
                .view()
                .sessions
                .iter()
                .nth(state.selected)
                .map(|(_, s)| s.id.clone());

            let Some(session_id) = session_id else {
                return Action::None;
            };

            match ctx.dashboard.view_session(&session_id) {
                Ok(()) => Action::Transition(Screen::Monitor(MonitorState::new())),
                Err(e) => {
                    report::<()>(state, Err(e));
                    Action::None
                }
            }
        }
        _ => Action::None,
    }
}

fn handle_form(state: &mut NetworkState, key: KeyCode, ctx: &mut Ctx) -> Action {
    match state.form.handle_key(key) {
        FormOutcome::None => Action::None,
        FormOutcome::Back => {
            let res = ctx.runtime.block_on(ctx.dashboard.show_sessions());
            report(state, res);
            Action::None
        }
        FormOutcome::Submit => {
            let started = ctx
                .runtime
                .block_on(ctx.dashboard.start_session(&state.form.draft));

            match started {
                Ok(_) => {
                    state.form = CreateForm::new();
                    Action::Transition(Screen::Monitor(MonitorState::new()))
                }
                Err(e) => {
                    warn!("cannot start session: {e}");
                    Action::None
                }
            }
        }
    }
}

fn toggle_online(state: &mut NetworkState, ctx: &mut Ctx) {
    if ctx.dashboard.view().phase == Phase::Offline {
        let joined = ctx.runtime.block_on(ctx.dashboard.join_network());
        if let Some(Joined::PeerConsole) = report(state, joined) {
            state.notice = Some("online, your machine now trains for the network".into());
        }
    } else {
        let res = ctx.runtime.block_on(ctx.dashboard.leave_network());
        report(state, res);
    }
}

/// Surfaces failures the dashboard doesn't keep in its own error line.
fn report<T>(state: &mut NetworkState, res: Result<T, DashboardError>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e @ (DashboardError::InvalidTransition { .. } | DashboardError::Forbidden { .. })) => {
            state.notice = Some(e.to_string());
            None
        }
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}

pub fn draw(f: &mut Frame, state: &NetworkState, dashboard: &Dashboard<HttpBackend>) {
    let view = dashboard.view();
    let area = f.size();
    f.render_widget(Block::default().style(Theme::base()), area);

    let (header, body, status, hints) = layout::vertical(area);
    f.render_widget(widgets::header(view), header);

    match &view.phase {
        Phase::Offline => draw_offline(f, body, view.role),
        Phase::Idle(tab) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(3)])
                .split(body);

            draw_tabs(f, rows[0], view.role, *tab);
            match tab {
                IdleView::Sessions => draw_sessions(f, rows[1], state, dashboard),
                IdleView::Create => create::draw(f, rows[1], &state.form),
            }
        }
        _ => {}
    }

    f.render_widget(
        widgets::status_line(view.error.as_deref(), state.notice.as_deref()),
        status,
    );

    let keys: &[(&str, &str)] = match &view.phase {
        Phase::Offline => &[("o", "join network"), ("esc", "menu"), ("q", "quit")],
        Phase::Idle(IdleView::Create) => &[
            ("↑↓ / tab", "field"),
            ("enter", "start session"),
            ("esc", "sessions"),
        ],
        _ => match view.role {
            Role::Trainer => &[
                ("↑↓", "select"),
                ("enter", "monitor"),
                ("n", "new session"),
                ("r", "refresh"),
                ("o", "leave network"),
                ("q", "quit"),
            ],
            Role::Peer => &[
                ("↑↓", "select"),
                ("enter", "monitor"),
                ("r", "refresh"),
                ("o", "leave network"),
                ("q", "quit"),
            ],
        },
    };
    f.render_widget(widgets::hints(keys), hints);
}

fn draw_offline(f: &mut Frame, area: Rect, role: Role) {
    let text = match role {
        Role::Trainer => "You are offline. Join the network to create and monitor sessions.",
        Role::Peer => "You are offline. Join the network to lend your compute to training sessions.",
    };

    let lines = vec![
        Line::default(),
        Line::from(Span::styled(text, Theme::dim())),
        Line::default(),
        Line::from(vec![
            Span::styled("press ", Theme::muted()),
            Span::styled("o", Theme::title()),
            Span::styled(" to go online", Theme::muted()),
        ]),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(widgets::panel("Network")),
        area,
    );
}

fn draw_tabs(f: &mut Frame, area: Rect, role: Role, tab: IdleView) {
    let titles = match role {
        Role::Trainer => vec!["Sessions", "New session"],
        Role::Peer => vec!["Sessions"],
    };
    let selected = match tab {
        IdleView::Sessions => 0,
        IdleView::Create => 1,
    };

    f.render_widget(
        Tabs::new(titles)
            .select(selected)
            .style(Theme::dim())
            .highlight_style(Theme::title())
            .divider(" | "),
        area,
    );
}

fn draw_sessions(
    f: &mut Frame,
    area: Rect,
    state: &NetworkState,
    dashboard: &Dashboard<HttpBackend>,
) {
    let sessions = &dashboard.view().sessions;

    if sessions.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("no sessions yet", Theme::muted()))
                .alignment(Alignment::Center)
                .block(widgets::panel("Sessions")),
            area,
        );
        return;
    }

    let header = Row::new(vec!["", "session", "name", "status", "created"]).style(Theme::bold());

    let rows = sessions.iter().map(|(ownership, s)| {
        let owner = match ownership {
            Ownership::Owned => "owned",
            Ownership::Joined => "joined",
        };
        let status = s.status.map_or("-", |st| st.as_str());
        let status_style = s.status.map_or(Theme::muted(), Theme::status);

        Row::new(vec![
            Cell::from(owner).style(Theme::dim()),
            Cell::from(metrics::display_id(&s.id, 20, 8, 8).into_owned()),
            Cell::from(s.name.clone().unwrap_or_default()),
            Cell::from(status).style(status_style),
            Cell::from(s.created_at.clone().unwrap_or_default()).style(Theme::dim()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(20),
            Constraint::Min(12),
            Constraint::Length(10),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .highlight_style(Theme::highlight_bg())
    .highlight_symbol("▶ ")
    .block(widgets::panel("Sessions"));

    let mut table_state = TableState::default();
    table_state.select(Some(state.selected.min(sessions.len() - 1)));
    f.render_stateful_widget(table, area, &mut table_state);
}
