use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use api::{types::FullResults, HttpBackend};
use crossterm::event::KeyCode;
use log::{info, warn};
use orchestrator::{
    configs::Palette,
    curve::{self, Canvas, Metric},
    metrics::{self, PeerSummary, SessionOverview},
    Dashboard, DashboardError,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use crate::{
    app::Ctx,
    ui::{layout, theme::Theme, widgets},
};

use super::{analysis::AnalysisState, network::NetworkState, Action, Screen};

const MAX_CARDS: usize = 4;
const LOG_LINES: usize = 7;

pub struct MonitorState {
    pub notice: Option<String>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self { notice: None }
    }
}

pub fn handle_key(state: &mut MonitorState, key: KeyCode, ctx: &mut Ctx) -> Action {
    state.notice = None;

    match key {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('b') | KeyCode::Esc => {
            if let Err(e) = ctx.runtime.block_on(ctx.dashboard.back_to_sessions()) {
                warn!("going back to the sessions: {e}");
            }
            Action::Transition(Screen::Network(NetworkState::new()))
        }
        KeyCode::Char('x') => {
            ctx.dashboard.dismiss_error();
            Action::None
        }
        KeyCode::Char('a') => match ctx.runtime.block_on(ctx.dashboard.request_analysis()) {
            Ok(_) => Action::Transition(Screen::Analysis(AnalysisState::new())),
            Err(DashboardError::InvalidTransition { .. }) => {
                state.notice = Some("no epoch data to analyse yet".into());
                Action::None
            }
            Err(e) => {
                warn!("analysis failed: {e}");
                Action::None
            }
        },
        KeyCode::Char('e') => {
            state.notice = Some(match export(ctx.dashboard) {
                Ok(path) => match open::that(&path) {
                    Ok(()) => format!("curves exported to {}", path.display()),
                    Err(e) => {
                        warn!("cannot open {}: {e}", path.display());
                        format!("curves exported to {} (could not open it)", path.display())
                    }
                },
                Err(e) => e.to_string(),
            });
            Action::None
        }
        _ => Action::None,
    }
}

/// Writes the monitored session's curves as an SVG file.
///
/// # Returns
/// Where the file was written.
///
/// # Errors
/// Returns an error if there are no results yet or the file cannot be written.
fn export(dashboard: &Dashboard<HttpBackend>) -> Result<PathBuf> {
    let results = dashboard
        .view()
        .results
        .as_ref()
        .ok_or_else(|| anyhow!("no results to export yet"))?;

    let svg = curve::render_svg(results, &dashboard.config().palette, Canvas::default());
    let path = std::env::temp_dir().join(export_name(&results.session_id));
    std::fs::write(&path, svg).with_context(|| format!("cannot write {}", path.display()))?;

    info!("exported curves of session {} to {}", results.session_id, path.display());
    Ok(path)
}

fn export_name(session_id: &str) -> String {
    let safe: String = session_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("decentrify-{safe}.svg")
}

pub fn draw(f: &mut Frame, state: &MonitorState, dashboard: &Dashboard<HttpBackend>) {
    let view = dashboard.view();
    let area = f.size();
    f.render_widget(Block::default().style(Theme::base()), area);

    let (header, body, status, hints) = layout::vertical(area);
    f.render_widget(widgets::header(view), header);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(6)])
        .split(body);
    let (charts, peers, logs) = layout::monitor(rows[1]);

    let session_id = view.phase.session_id().unwrap_or_default();
    f.render_widget(session_line(session_id, view.results.as_ref()), rows[0]);

    match &view.results {
        Some(results) if SessionOverview::of(results).has_results => {
            draw_charts(f, charts, results, dashboard);
            draw_cards(f, peers, results, dashboard);
        }
        results => {
            let merged = Rect {
                height: charts.height + peers.height,
                ..charts
            };
            draw_waiting(f, merged, results.as_ref());
        }
    }

    f.render_widget(widgets::logs(&view.logs, LOG_LINES), logs);

    f.render_widget(
        widgets::status_line(view.error.as_deref(), state.notice.as_deref()),
        status,
    );
    f.render_widget(
        widgets::hints(&[
            ("a", "analyse"),
            ("e", "export curves"),
            ("b", "back"),
            ("x", "dismiss"),
            ("q", "quit"),
        ]),
        hints,
    );
}

fn session_line<'a>(session_id: &'a str, results: Option<&FullResults>) -> Paragraph<'a> {
    let mut spans = vec![
        Span::styled(" session ", Theme::dim()),
        Span::styled(session_id, Theme::bold()),
    ];

    if let Some(results) = results {
        let overview = SessionOverview::of(results);
        spans.push(Span::styled("  |  ", Theme::muted()));
        spans.push(Span::styled(
            results.status.as_str(),
            Theme::status(results.status),
        ));
        spans.push(Span::styled(
            format!(
                "  |  peers {}/{}",
                overview.online_peers, overview.total_peers
            ),
            Theme::dim(),
        ));
    }

    Paragraph::new(Line::from(spans))
}

fn draw_waiting(f: &mut Frame, area: Rect, results: Option<&FullResults>) {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled("waiting for epoch data...", Theme::warn())),
    ];

    if let Some(results) = results {
        lines.push(Line::from(Span::styled(
            format!("{} peer(s) syncing", results.peers.len()),
            Theme::dim(),
        )));
    }

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(widgets::panel("Training")),
        area,
    );
}

/// One peer's curve, owned so that chart datasets can borrow it.
struct Series {
    name: String,
    style: Style,
    points: Vec<(f64, f64)>,
}

fn draw_charts(
    f: &mut Frame,
    area: Rect,
    results: &FullResults,
    dashboard: &Dashboard<HttpBackend>,
) {
    let palette = &dashboard.config().palette;
    let loss = series(results, Metric::Loss, palette);
    let accuracy = series(results, Metric::Accuracy, palette);

    let (loss_area, acc_area) = layout::halves(area);
    f.render_widget(chart("Loss", Metric::Loss, &loss), loss_area);
    f.render_widget(chart("Accuracy", Metric::Accuracy, &accuracy), acc_area);
}

fn series(results: &FullResults, metric: Metric, palette: &Palette) -> Vec<Series> {
    results
        .peers
        .iter()
        .enumerate()
        .filter(|(_, (_, peer))| !peer.epochs.is_empty())
        .map(|(idx, (peer_id, peer))| Series {
            name: metrics::display_id(peer_id, 12, 4, 4).into_owned(),
            style: Style::default().fg(Theme::peer(palette.color(idx))),
            points: curve::series(&peer.epochs, metric),
        })
        .collect()
}

fn chart<'a>(title: &'a str, metric: Metric, series: &'a [Series]) -> Chart<'a> {
    let points = || series.iter().flat_map(|s| s.points.iter());
    let max_epoch = points().map(|(x, _)| *x).fold(2.0_f64, f64::max);
    let max_value = points().map(|(_, y)| *y).fold(0.0_f64, f64::max);
    let y_max = match metric {
        Metric::Loss => (max_value * 1.1).max(0.1),
        Metric::Accuracy => max_value.max(1.0),
    };

    let datasets = series
        .iter()
        .map(|s| {
            Dataset::default()
                .name(s.name.as_str())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(s.style)
                .data(&s.points)
        })
        .collect::<Vec<_>>();

    Chart::new(datasets)
        .block(widgets::panel(title))
        .x_axis(
            Axis::default()
                .title(Span::styled("epoch", Theme::muted()))
                .style(Theme::dim())
                .bounds([1.0, max_epoch])
                .labels(vec![Span::raw("1"), Span::raw(format!("{}", max_epoch as u32))]),
        )
        .y_axis(
            Axis::default()
                .style(Theme::dim())
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.2}", y_max / 2.0)),
                    Span::raw(format!("{y_max:.2}")),
                ]),
        )
}

fn draw_cards(
    f: &mut Frame,
    area: Rect,
    results: &FullResults,
    dashboard: &Dashboard<HttpBackend>,
) {
    let palette = &dashboard.config().palette;
    let shown = results.peers.len().min(MAX_CARDS);
    let cols = layout::columns(area, shown);

    for (idx, ((peer_id, peer), col)) in results.peers.iter().zip(cols).enumerate() {
        let summary = PeerSummary::of(peer, results.status);
        let color = Style::default().fg(Theme::peer(palette.color(idx)));
        f.render_widget(widgets::peer_card(peer_id, &summary, color), col);
    }
}
