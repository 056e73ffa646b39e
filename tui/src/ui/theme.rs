use api::types::{LogLevel, SessionStatus};
use orchestrator::configs::Rgb;
use ratatui::style::{Color, Modifier, Style};

/// Dark theme with an orange accent.
///
/// Base aesthetic:
/// - light grey foreground
/// - near-black background
/// - orange titles, cyan highlights, traffic-light statuses
pub struct Theme;

impl Theme {
    // Core palette
    pub const BG: Color = Color::Rgb(12, 12, 16);
    pub const FG: Color = Color::Rgb(226, 232, 240);
    pub const FG_DIM: Color = Color::Rgb(148, 163, 184);
    pub const FG_MUTED: Color = Color::Rgb(71, 85, 105);

    // Accents
    pub const ACCENT: Color = Color::Rgb(249, 115, 22);
    pub const ACCENT_CYAN: Color = Color::Rgb(6, 182, 212);
    pub const ACCENT_GREEN: Color = Color::Rgb(16, 185, 129);
    pub const ACCENT_YELLOW: Color = Color::Rgb(245, 158, 11);
    pub const ACCENT_RED: Color = Color::Rgb(239, 68, 68);

    /// Default full-screen style.
    pub fn base() -> Style {
        Style::default().fg(Self::FG).bg(Self::BG)
    }

    /// Panel borders.
    pub fn border() -> Style {
        Style::default().fg(Self::FG_MUTED).bg(Self::BG)
    }

    /// Border of the focused panel or field.
    pub fn border_focus() -> Style {
        Style::default().fg(Self::ACCENT).bg(Self::BG)
    }

    /// Titles (bold orange).
    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn bold() -> Style {
        Self::text().add_modifier(Modifier::BOLD)
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::FG_MUTED)
    }

    /// Highlight row background.
    pub fn highlight_bg() -> Style {
        Style::default()
            .bg(Color::Rgb(40, 24, 12))
            .add_modifier(Modifier::BOLD)
    }

    pub fn ok() -> Style {
        Style::default()
            .fg(Self::ACCENT_GREEN)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warn() -> Style {
        Style::default()
            .fg(Self::ACCENT_YELLOW)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Self::ACCENT_RED)
            .add_modifier(Modifier::BOLD)
    }

    pub fn info() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn accent_cyan() -> Style {
        Style::default()
            .fg(Self::ACCENT_CYAN)
            .add_modifier(Modifier::BOLD)
    }

    pub fn log_level(level: LogLevel) -> Style {
        match level {
            LogLevel::Error => Self::error(),
            LogLevel::Warning => Self::warn(),
            LogLevel::Success => Self::ok(),
            LogLevel::Info => Self::info(),
        }
    }

    pub fn status(status: SessionStatus) -> Style {
        match status {
            SessionStatus::Running => Self::ok(),
            SessionStatus::Completed => Self::accent_cyan(),
            SessionStatus::Offline => Self::muted(),
        }
    }

    /// The terminal colour of a palette entry.
    pub fn peer(rgb: Rgb) -> Color {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    }
}
