use std::io;
use std::time::Duration;

use anyhow::Result;
use api::HttpBackend;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use orchestrator::{
    configs::{DashboardConfig, Role},
    Dashboard, Phase,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::{self, Runtime};

use crate::ui::screens::{menu::MenuState, network::NetworkState, Action, Screen};

use super::Ctx;

const FRAME: Duration = Duration::from_millis(120);
const EXPIRED_NOTICE: &str = "Your session expired, log in again to continue.";

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Owns the runtime, the dashboard of the logged in role and the current screen.
struct App {
    runtime: Runtime,
    config: DashboardConfig,
    dashboard: Option<Dashboard<HttpBackend>>,
    screen: Screen,
}

impl App {
    fn new(config: DashboardConfig) -> Result<Self> {
        let runtime = runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("decentrify-poll")
            .enable_all()
            .build()?;

        Ok(Self {
            runtime,
            config,
            dashboard: None,
            screen: Screen::Menu(MenuState::new()),
        })
    }

    fn login(&mut self, role: Role) {
        let mut config = self.config.clone();
        config.role = role;

        let backend = match HttpBackend::new(
            &config.api_base_url,
            config.token.clone(),
            config.request_timeout,
        ) {
            Ok(backend) => backend,
            Err(e) => {
                warn!("cannot create the api client: {e}");
                self.screen = Screen::Menu(MenuState::with_notice(e.to_string()));
                return;
            }
        };

        info!("logged in as {role} against {}", config.api_base_url);
        let handle = self.runtime.handle().clone();
        self.dashboard = Some(Dashboard::new(backend, config, handle));
        self.screen = Screen::Network(NetworkState::new());
    }

    /// Leaves the network if still online, from any screen, and drops the
    /// dashboard, which stops its polls.
    fn logout(&mut self) {
        if let Some(mut dashboard) = self.dashboard.take() {
            self.runtime.block_on(dashboard.shutdown());
        }
    }

    fn tick(&mut self) {
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.tick();
        }
        self.check_expired();
    }

    /// Sends the user back to the menu once the backend rejected the session.
    fn check_expired(&mut self) {
        let expired = self
            .dashboard
            .as_ref()
            .is_some_and(|d| d.view().phase == Phase::LoggedOut);

        if expired {
            warn!("session expired, back to the menu");
            self.dashboard = None;
            self.screen = Screen::Menu(MenuState::with_notice(EXPIRED_NOTICE));
        }
    }

    /// Dispatches a key to the current screen.
    ///
    /// # Returns
    /// `true` if the application should exit.
    fn handle_key(&mut self, key: KeyCode) -> bool {
        let action = match (&mut self.screen, self.dashboard.as_mut()) {
            (Screen::Menu(state), _) => crate::ui::screens::menu::handle_key(state, key),
            (screen, Some(dashboard)) => {
                let mut ctx = Ctx {
                    runtime: &self.runtime,
                    dashboard,
                };
                screen.handle_key(key, &mut ctx)
            }
            (_, None) => Action::Transition(Screen::Menu(MenuState::new())),
        };

        match action {
            Action::None => {}
            Action::Quit => return true,
            Action::Transition(next) => self.screen = next,
            Action::Login(role) => self.login(role),
            Action::Logout => {
                self.logout();
                self.screen = Screen::Menu(MenuState::new());
            }
        }

        self.check_expired();
        false
    }
}

/// Runs the TUI application.
///
/// # Arguments
/// * `config` - The assembled dashboard configuration.
/// * `skip_menu` - Log in right away with the configured role.
///
/// # Errors
/// Returns an error if terminal setup or rendering fails.
pub fn run(config: DashboardConfig, skip_menu: bool) -> Result<()> {
    let mut app = App::new(config)?;
    if skip_menu {
        let role = app.config.role;
        app.login(role);
    }

    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    loop {
        app.tick();
        terminal.draw(|f| app.screen.draw(f, app.dashboard.as_ref()))?;

        if event::poll(FRAME)? {
            if let Event::Key(k) = event::read()? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(k.code) {
                    break;
                }
            }
        }
    }

    app.logout();
    terminal.show_cursor()?;
    Ok(())
}
