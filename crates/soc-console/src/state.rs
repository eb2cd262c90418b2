use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use soc_client::engine::{Command, UiEvent};
use soc_client::source::SourceKind;
use soc_client::state::Dashboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Main,
}

#[derive(Debug)]
pub struct App {
    pub screen: Screen,
    pub password: String,
    pub verifying: bool,
    pub alert: Option<String>,
    pub confirm_delete: Option<String>,
    pub selected: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            password: String::new(),
            verifying: false,
            alert: None,
            confirm_delete: None,
            selected: 0,
            should_quit: false,
        }
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::SessionOpened => {
                self.screen = Screen::Main;
                self.verifying = false;
                self.password.clear();
                self.selected = 0;
            }
            UiEvent::SessionClosed => {
                self.screen = Screen::Login;
                self.confirm_delete = None;
                self.selected = 0;
            }
            UiEvent::Alert(message) => {
                self.alert = Some(message);
                self.verifying = false;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, dashboard: &Dashboard) -> Vec<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }

        if self.alert.take().is_some() {
            return Vec::new();
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Main => self.handle_main_key(key, dashboard),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Enter => {
                if self.password.is_empty() || self.verifying {
                    return Vec::new();
                }
                self.verifying = true;
                vec![Command::Login(self.password.clone())]
            }
            KeyCode::Backspace => {
                self.password.pop();
                Vec::new()
            }
            KeyCode::Char(c) => {
                self.password.push(c);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent, dashboard: &Dashboard) -> Vec<Command> {
        if let Some(address) = self.confirm_delete.take() {
            if key.code == KeyCode::Char('y') {
                return vec![Command::DeleteClient(address)];
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Char('l') => vec![Command::Logout],
            KeyCode::Char('r') => vec![Command::RefreshRecords],
            KeyCode::Char('1') => self.select_source(SourceKind::Clients, dashboard),
            KeyCode::Char('2') => self.select_source(SourceKind::Sessions, dashboard),
            KeyCode::Char('3') => self.select_source(SourceKind::Sync, dashboard),
            KeyCode::Char('4') => self.select_source(SourceKind::Logs, dashboard),
            KeyCode::Tab => {
                let current = SourceKind::ALL
                    .iter()
                    .position(|kind| *kind == dashboard.active)
                    .unwrap_or(0);
                let next = SourceKind::ALL[(current + 1) % SourceKind::ALL.len()];
                self.select_source(next, dashboard)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let rows = row_count(dashboard);
                if rows > 0 && self.selected + 1 < rows {
                    self.selected += 1;
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if dashboard.active == SourceKind::Clients {
                    if let Some(address) = self.selected_address(dashboard) {
                        return vec![Command::ToggleExpanded(address)];
                    }
                }
                Vec::new()
            }
            KeyCode::Char('d') => {
                if dashboard.active == SourceKind::Clients {
                    if let Some(address) = self.selected_address(dashboard) {
                        self.confirm_delete = Some(address);
                    }
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn select_source(&mut self, kind: SourceKind, dashboard: &Dashboard) -> Vec<Command> {
        if dashboard.active == kind {
            return Vec::new();
        }
        self.selected = 0;
        vec![Command::SelectSource(kind)]
    }

    pub fn clamp_selection(&mut self, dashboard: &Dashboard) {
        let rows = row_count(dashboard);
        if rows == 0 {
            self.selected = 0;
        } else if self.selected >= rows {
            self.selected = rows - 1;
        }
    }

    fn selected_address(&self, dashboard: &Dashboard) -> Option<String> {
        dashboard
            .clients
            .order()
            .get(self.selected)
            .map(|key| key.address.clone())
    }
}

pub fn row_count(dashboard: &Dashboard) -> usize {
    match dashboard.active {
        SourceKind::Clients => dashboard.clients.len(),
        SourceKind::Sessions => dashboard.sessions.rows.len(),
        SourceKind::Sync => dashboard.sync.view.partners.len(),
        SourceKind::Logs => dashboard.logs.rows.len(),
    }
}
