pub mod analysis;
pub mod create;
pub mod menu;
pub mod monitor;
pub mod network;

use api::HttpBackend;
use crossterm::event::KeyCode;
use orchestrator::{configs::Role, Dashboard};
use ratatui::Frame;

use crate::app::Ctx;

pub enum Action {
    None,
    Quit,
    Transition(Screen),
    /// Create a dashboard for the role and go to the network screen.
    Login(Role),
    /// Drop the dashboard and go back to the menu.
    Logout,
}

pub enum Screen {
    Menu(menu::MenuState),
    Network(network::NetworkState),
    Monitor(monitor::MonitorState),
    Analysis(analysis::AnalysisState),
}

impl Screen {
    pub fn draw(&self, f: &mut Frame, dashboard: Option<&Dashboard<HttpBackend>>) {
        match (self, dashboard) {
            (Screen::Menu(s), _) => menu::draw(f, s),
            (Screen::Network(s), Some(d)) => network::draw(f, s, d),
            (Screen::Monitor(s), Some(d)) => monitor::draw(f, s, d),
            (Screen::Analysis(s), Some(d)) => analysis::draw(f, s, d),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyCode, ctx: &mut Ctx) -> Action {
        match self {
            Screen::Menu(s) => menu::handle_key(s, key),
            Screen::Network(s) => network::handle_key(s, key, ctx),
            Screen::Monitor(s) => monitor::handle_key(s, key, ctx),
            Screen::Analysis(s) => analysis::handle_key(s, key, ctx),
        }
    }
}
