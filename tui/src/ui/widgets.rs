use api::types::LogEntry;
use orchestrator::{
    configs::Role,
    metrics::{self, PeerSummary},
    DashboardView, Phase,
};
use ratatui::{
    layout::Alignment,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::theme::Theme;

const PROGRESS_WIDTH: usize = 20;

pub fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .title(format!(" {title} "))
        .title_style(Theme::title())
}

pub fn header(view: &DashboardView) -> Paragraph<'static> {
    let (badge, badge_style) = match &view.phase {
        Phase::Offline => ("OFFLINE", Theme::muted()),
        Phase::LoggedOut => ("LOGGED OUT", Theme::error()),
        _ => ("ONLINE", Theme::ok()),
    };

    let line1 = Line::from(vec![
        Span::styled("DECENTRIFY", Theme::title()),
        Span::styled("  |  ", Theme::muted()),
        Span::styled(view.role.as_str().to_uppercase(), Theme::bold()),
        Span::styled("  |  ", Theme::muted()),
        Span::styled(badge, badge_style),
        Span::styled(if view.loading { "  ..." } else { "" }, Theme::dim()),
    ]);

    let line2 = match view.role {
        Role::Trainer => Line::from(vec![
            Span::styled("peers online: ", Theme::dim()),
            Span::styled(view.online_peers.to_string(), Theme::accent_cyan()),
            Span::styled(format!("  |  sessions: {}", view.sessions.len()), Theme::dim()),
        ]),
        Role::Peer => Line::from(vec![
            Span::styled("uptime: ", Theme::dim()),
            Span::styled(
                metrics::format_uptime(view.uptime.as_secs()),
                Theme::accent_cyan(),
            ),
            Span::styled(
                if view.phase.is_online() {
                    "  |  contributing compute"
                } else {
                    "  |  join the network to contribute"
                },
                Theme::dim(),
            ),
        ]),
    };

    Paragraph::new(vec![line1, line2])
        .block(panel("Overview"))
        .wrap(Wrap { trim: true })
}

/// The line under the body: the last error, or `fallback` when there is none.
pub fn status_line<'a>(error: Option<&'a str>, fallback: Option<&'a str>) -> Paragraph<'a> {
    let line = match (error, fallback) {
        (Some(err), _) => Line::from(vec![
            Span::styled(" ✖ ", Theme::error()),
            Span::styled(err, Theme::error()),
            Span::styled("   x dismiss", Theme::muted()),
        ]),
        (None, Some(msg)) => Line::from(Span::styled(format!(" {msg}"), Theme::dim())),
        (None, None) => Line::default(),
    };

    Paragraph::new(line)
}

pub fn hints<'a>(hints: &[(&'a str, &'a str)]) -> Paragraph<'a> {
    let spans = hints
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(*key, Theme::dim()),
                Span::styled(format!("  {label}    "), Theme::muted()),
            ]
        })
        .collect::<Vec<_>>();

    Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
}

pub fn logs(entries: &[LogEntry], max: usize) -> Paragraph<'_> {
    let tail = entries.iter().rev().take(max).rev();

    let lines = tail
        .map(|l| {
            let style = Theme::log_level(l.level());
            Line::from(vec![
                Span::styled(
                    l.timestamp.as_deref().map(short_time).unwrap_or_default(),
                    Theme::muted(),
                ),
                Span::styled(format!("[{}] ", l.log_level), style),
                Span::styled(
                    format!("{}: ", metrics::display_id(&l.peer_id, 12, 4, 4)),
                    Theme::dim(),
                ),
                Span::styled(l.message.as_str(), Theme::text()),
            ])
        })
        .collect::<Vec<_>>();

    let lines = if lines.is_empty() {
        vec![Line::from(Span::styled("no logs yet", Theme::muted()))]
    } else {
        lines
    };

    Paragraph::new(lines)
        .block(panel("System logs"))
        .wrap(Wrap { trim: true })
}

/// One peer's figures, framed in the peer's colour.
pub fn peer_card<'a>(peer_id: &str, summary: &PeerSummary, color: Style) -> Paragraph<'a> {
    let title = metrics::display_id(peer_id, 16, 5, 6).into_owned();

    let lines = if summary.syncing {
        vec![Line::from(Span::styled("syncing...", Theme::warn()))]
    } else {
        let mut lines = Vec::new();
        if let Some(latest) = summary.latest {
            lines.push(Line::from(vec![
                Span::styled(format!("epoch {}  ", latest.epoch), Theme::bold()),
                Span::styled(
                    format!("loss {:.4}  acc {:.2}%", latest.loss, latest.accuracy * 100.0),
                    Theme::text(),
                ),
            ]));
        }

        lines.push(Line::from(Span::styled(
            format!(
                "avg loss {:.4}  avg acc {:.2}%",
                summary.avg_loss,
                summary.avg_accuracy * 100.0
            ),
            Theme::dim(),
        )));

        lines.push(Line::from(vec![
            Span::styled(progress_bar(summary.progress()), color),
            Span::styled(
                format!(" {:>3.0}%", summary.progress() * 100.0),
                Theme::dim(),
            ),
        ]));

        if let Some(trend) = summary.trend() {
            let style = if summary.improvement > 0.0 {
                Theme::ok()
            } else {
                Theme::error()
            };
            lines.push(Line::from(Span::styled(
                format!("{:+.2}% {}", summary.improvement, trend.label()),
                style,
            )));
        }

        lines
    };

    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(color)
            .title(format!(" {title} "))
            .title_style(color),
    )
}

fn progress_bar(fraction: f64) -> String {
    let filled = (fraction * PROGRESS_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(PROGRESS_WIDTH - filled)
    )
}

/// Keeps the `HH:MM:SS` part of an ISO timestamp.
fn short_time(ts: &str) -> String {
    match ts.split_once('T') {
        Some((_, time)) => format!("{} ", time.chars().take(8).collect::<String>()),
        None => format!("{ts} "),
    }
}
