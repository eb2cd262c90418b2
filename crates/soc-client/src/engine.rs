use crate::api::{ApiClient, ApiError};
use crate::poller::Poller;
use crate::source::{self, SourceKind, SourcePayload};
use crate::state::Dashboard;
use soc_core::{AuthGrant, DeleteOutcome, StatusReport};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub const RECORDS_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(20);

const GENERIC_ALERT: &str = "The request could not be completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Records,
    Status,
}

#[derive(Debug)]
pub enum EngineMsg {
    Tick(TickKind),
    SourceFetched {
        kind: SourceKind,
        outcome: Result<SourcePayload, ApiError>,
    },
    StatusFetched(Result<StatusReport, ApiError>),
    LoginFinished(Result<AuthGrant, ApiError>),
    DeleteFinished {
        address: String,
        outcome: Result<DeleteOutcome, ApiError>,
    },
}

#[derive(Debug, Clone)]
pub enum Command {
    Login(String),
    Logout,
    SelectSource(SourceKind),
    ToggleExpanded(String),
    DeleteClient(String),
    RefreshRecords,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SessionOpened,
    SessionClosed,
    Alert(String),
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub records_interval: Duration,
    pub status_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            records_interval: RECORDS_POLL_INTERVAL,
            status_interval: STATUS_POLL_INTERVAL,
        }
    }
}

pub struct SyncEngine {
    api: ApiClient,
    tx: UnboundedSender<EngineMsg>,
    pub dashboard: Dashboard,
    records_poller: Poller,
    status_poller: Poller,
    in_flight: HashSet<SourceKind>,
    status_in_flight: bool,
    delete_in_flight: bool,
    resume_after_fetch: bool,
}

impl SyncEngine {
    pub fn new(api: ApiClient, tx: UnboundedSender<EngineMsg>, config: EngineConfig) -> Self {
        let records_poller = Poller::new(TickKind::Records, config.records_interval, tx.clone());
        let status_poller = Poller::new(TickKind::Status, config.status_interval, tx.clone());
        Self {
            api,
            tx,
            dashboard: Dashboard::new(),
            records_poller,
            status_poller,
            in_flight: HashSet::new(),
            status_in_flight: false,
            delete_in_flight: false,
            resume_after_fetch: false,
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Vec<UiEvent> {
        match command {
            Command::Login(password) => self.start_login(password),
            Command::Logout => self.close_session(),
            Command::SelectSource(kind) => {
                if self.dashboard.active == kind {
                    return Vec::new();
                }
                self.dashboard.active = kind;
                if self.dashboard.gate.logged_in() {
                    self.fetch_source(kind, false);
                    self.records_poller.reset();
                    self.records_poller.run();
                }
                Vec::new()
            }
            Command::ToggleExpanded(address) => {
                if let Some(client) = self.dashboard.clients.get_mut(&address) {
                    if client.expanded {
                        client.collapse();
                    } else {
                        client.expand();
                    }
                }
                Vec::new()
            }
            Command::DeleteClient(address) => self.start_delete(address),
            Command::RefreshRecords => {
                if self.dashboard.gate.logged_in() {
                    self.fetch_source(self.dashboard.active, true);
                    self.records_poller.reset();
                    self.records_poller.run();
                }
                Vec::new()
            }
        }
    }

    pub fn handle_msg(&mut self, msg: EngineMsg) -> Vec<UiEvent> {
        match msg {
            EngineMsg::Tick(TickKind::Records) => {
                if self.dashboard.gate.logged_in() {
                    self.fetch_source(self.dashboard.active, false);
                }
                Vec::new()
            }
            EngineMsg::Tick(TickKind::Status) => {
                if self.dashboard.gate.logged_in() {
                    self.fetch_status();
                }
                Vec::new()
            }
            EngineMsg::SourceFetched { kind, outcome } => self.apply_source_outcome(kind, outcome),
            EngineMsg::StatusFetched(outcome) => self.apply_status_outcome(outcome),
            EngineMsg::LoginFinished(outcome) => self.finish_login(outcome),
            EngineMsg::DeleteFinished { address, outcome } => self.finish_delete(address, outcome),
        }
    }

    pub fn is_fetching(&self, kind: SourceKind) -> bool {
        self.in_flight.contains(&kind)
    }

    pub fn pollers_idle(&self) -> bool {
        !self.records_poller.is_running() && !self.status_poller.is_running()
    }

    fn start_login(&mut self, password: String) -> Vec<UiEvent> {
        if password.is_empty() || !self.dashboard.gate.begin_verify() {
            return Vec::new();
        }

        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = api.login(&password).await;
            let _ = tx.send(EngineMsg::LoginFinished(outcome));
        });
        Vec::new()
    }

    fn finish_login(&mut self, outcome: Result<AuthGrant, ApiError>) -> Vec<UiEvent> {
        self.dashboard.gate.end_verify();
        match outcome {
            Ok(grant) => {
                info!("session opened");
                self.dashboard.gate.grant(grant);
                self.dashboard.charts.reset();
                self.records_poller.run();
                self.status_poller.run();
                self.fetch_status();
                self.fetch_source(self.dashboard.active, true);
                vec![UiEvent::SessionOpened]
            }
            Err(err) => {
                warn!(error = %err, "login rejected");
                vec![UiEvent::Alert(alert_message(&err))]
            }
        }
    }

    fn close_session(&mut self) -> Vec<UiEvent> {
        if !self.dashboard.gate.logged_in() {
            return Vec::new();
        }

        info!("session closed");
        self.dashboard.gate.clear();
        self.records_poller.reset();
        self.status_poller.reset();
        self.dashboard.show_loading = false;
        vec![UiEvent::SessionClosed]
    }

    fn fetch_source(&mut self, kind: SourceKind, show_loading: bool) {
        if !self.in_flight.insert(kind) {
            return;
        }

        if show_loading || !self.dashboard.source_loaded(kind) {
            self.dashboard.show_loading = true;
        }

        let api = self.api.clone();
        let tx = self.tx.clone();
        let token = self.dashboard.gate.bearer().map(str::to_owned);
        tokio::spawn(async move {
            let token = token.as_deref();
            let outcome = match kind {
                SourceKind::Clients => api.clients(token).await.map(SourcePayload::Clients),
                SourceKind::Sessions => api
                    .sessions(token)
                    .await
                    .map(|records| SourcePayload::Sessions(source::ingest_sessions(records))),
                SourceKind::Sync => api
                    .sync(token)
                    .await
                    .map(|topology| SourcePayload::Sync(source::ingest_sync(topology))),
                SourceKind::Logs => api
                    .logs(token)
                    .await
                    .map(|records| SourcePayload::Logs(source::ingest_logs(records))),
            };
            let _ = tx.send(EngineMsg::SourceFetched { kind, outcome });
        });
    }

    fn fetch_status(&mut self) {
        if self.status_in_flight {
            return;
        }
        self.status_in_flight = true;

        let api = self.api.clone();
        let tx = self.tx.clone();
        let token = self.dashboard.gate.bearer().map(str::to_owned);
        tokio::spawn(async move {
            let outcome = api.status(token.as_deref()).await;
            let _ = tx.send(EngineMsg::StatusFetched(outcome));
        });
    }

    fn apply_source_outcome(
        &mut self,
        kind: SourceKind,
        outcome: Result<SourcePayload, ApiError>,
    ) -> Vec<UiEvent> {
        self.in_flight.remove(&kind);
        self.dashboard.show_loading = false;

        if !self.dashboard.gate.logged_in() {
            self.resume_after_fetch = false;
            return Vec::new();
        }

        if kind == SourceKind::Clients && std::mem::take(&mut self.resume_after_fetch) {
            self.records_poller.run();
        }

        match outcome {
            Ok(payload) => {
                self.dashboard.apply_payload(payload);
                Vec::new()
            }
            Err(err) if err.is_auth() => self.close_session(),
            Err(err) => {
                debug!(source = kind.as_str(), error = %err, "background fetch failed");
                Vec::new()
            }
        }
    }

    fn apply_status_outcome(&mut self, outcome: Result<StatusReport, ApiError>) -> Vec<UiEvent> {
        self.status_in_flight = false;

        if !self.dashboard.gate.logged_in() {
            return Vec::new();
        }

        match outcome {
            Ok(report) => {
                self.dashboard.apply_status(&report);
                Vec::new()
            }
            Err(err) if err.is_auth() => self.close_session(),
            Err(err) => {
                debug!(error = %err, "status fetch failed");
                Vec::new()
            }
        }
    }

    fn start_delete(&mut self, address: String) -> Vec<UiEvent> {
        if !self.dashboard.gate.logged_in() || self.delete_in_flight {
            return Vec::new();
        }

        match self.dashboard.clients.get_mut(&address) {
            Some(client) if !client.deleting => client.deleting = true,
            _ => return Vec::new(),
        }

        self.delete_in_flight = true;
        self.records_poller.reset();

        let api = self.api.clone();
        let tx = self.tx.clone();
        let token = self.dashboard.gate.bearer().map(str::to_owned);
        tokio::spawn(async move {
            let outcome = api.delete_client(token.as_deref(), &address).await;
            let _ = tx.send(EngineMsg::DeleteFinished { address, outcome });
        });
        Vec::new()
    }

    fn finish_delete(
        &mut self,
        address: String,
        outcome: Result<DeleteOutcome, ApiError>,
    ) -> Vec<UiEvent> {
        self.delete_in_flight = false;
        if let Some(client) = self.dashboard.clients.get_mut(&address) {
            client.deleting = false;
        }

        if !self.dashboard.gate.logged_in() {
            return Vec::new();
        }

        match outcome {
            Ok(DeleteOutcome { result: true }) => {
                info!(client = %address, "client removed");
                self.resume_after_fetch = true;
                self.fetch_source(SourceKind::Clients, false);
                Vec::new()
            }
            Ok(DeleteOutcome { result: false }) => {
                self.records_poller.run();
                vec![UiEvent::Alert(GENERIC_ALERT.to_string())]
            }
            Err(err) if err.is_auth() => {
                let mut events = self.close_session();
                events.push(UiEvent::Alert(alert_message(&err)));
                events
            }
            Err(err) => {
                self.records_poller.run();
                vec![UiEvent::Alert(alert_message(&err))]
            }
        }
    }
}

fn alert_message(err: &ApiError) -> String {
    err.user_message()
        .map(str::to_owned)
        .unwrap_or_else(|| GENERIC_ALERT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ingest_logs, SessionRow};
    use chrono::Utc;
    use soc_core::ClientRecord;
    use std::collections::HashMap;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn engine() -> (SyncEngine, UnboundedReceiver<EngineMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api = ApiClient::new("http://127.0.0.1:9").expect("api client");
        (SyncEngine::new(api, tx, EngineConfig::default()), rx)
    }

    fn grant() -> AuthGrant {
        AuthGrant {
            token: "tok-test".to_string(),
            permissions: HashMap::new(),
        }
    }

    fn auth_error() -> ApiError {
        ApiError::Auth {
            status: 403,
            message: None,
        }
    }

    fn client_record(address: &str) -> ClientRecord {
        ClientRecord {
            address: address.to_string(),
            first_seen: Utc::now(),
            last_seen: Utc::now(),
            count: 1,
            marked: true,
            records: Vec::new(),
        }
    }

    fn open_session(engine: &mut SyncEngine) {
        let events = engine.handle_msg(EngineMsg::LoginFinished(Ok(grant())));
        assert_eq!(events, vec![UiEvent::SessionOpened]);
    }

    #[tokio::test]
    async fn login_success_starts_pollers_and_initial_fetches() {
        let (mut engine, _rx) = engine();

        open_session(&mut engine);

        assert!(engine.dashboard.gate.logged_in());
        assert!(!engine.pollers_idle());
        assert!(engine.is_fetching(SourceKind::Clients));
        assert!(engine.status_in_flight);
        assert!(engine.dashboard.show_loading);
    }

    #[tokio::test]
    async fn login_failure_surfaces_alert_and_stays_logged_out() {
        let (mut engine, _rx) = engine();

        let events = engine.handle_msg(EngineMsg::LoginFinished(Err(ApiError::Status {
            status: 400,
            message: Some("bad password".to_string()),
        })));

        assert_eq!(events, vec![UiEvent::Alert("bad password".to_string())]);
        assert!(!engine.dashboard.gate.logged_in());
        assert!(engine.pollers_idle());
    }

    #[tokio::test]
    async fn auth_failure_on_any_source_closes_session_and_stops_pollers() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);

        let events = engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Sessions,
            outcome: Err(auth_error()),
        });

        assert_eq!(events, vec![UiEvent::SessionClosed]);
        assert!(!engine.dashboard.gate.logged_in());
        assert!(engine.pollers_idle());
    }

    #[tokio::test]
    async fn auth_failure_on_status_closes_session() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);

        let events = engine.handle_msg(EngineMsg::StatusFetched(Err(auth_error())));

        assert_eq!(events, vec![UiEvent::SessionClosed]);
        assert!(engine.pollers_idle());
    }

    #[tokio::test]
    async fn transport_failure_on_background_poll_is_absorbed() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);

        let events = engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Clients,
            outcome: Ok(SourcePayload::Clients(vec![client_record("203.0.113.1")])),
        });
        assert!(events.is_empty());

        let events = engine.handle_msg(EngineMsg::StatusFetched(Err(ApiError::Status {
            status: 500,
            message: None,
        })));

        assert!(events.is_empty());
        assert!(engine.dashboard.gate.logged_in());
        assert!(engine.dashboard.clients.loaded);
    }

    #[tokio::test]
    async fn ticks_are_ignored_while_logged_out() {
        let (mut engine, _rx) = engine();

        engine.handle_msg(EngineMsg::Tick(TickKind::Records));
        engine.handle_msg(EngineMsg::Tick(TickKind::Status));

        assert!(!engine.is_fetching(SourceKind::Clients));
        assert!(!engine.status_in_flight);
    }

    #[tokio::test]
    async fn at_most_one_fetch_per_source_is_in_flight() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);
        assert!(engine.is_fetching(SourceKind::Clients));

        engine.handle_msg(EngineMsg::Tick(TickKind::Records));
        assert!(engine.is_fetching(SourceKind::Clients));

        engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Clients,
            outcome: Ok(SourcePayload::Clients(Vec::new())),
        });
        assert!(!engine.is_fetching(SourceKind::Clients));
    }

    #[tokio::test]
    async fn outcomes_after_logout_are_discarded() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);
        engine.handle_command(Command::Logout);

        let rows = vec![SessionRow {
            ip: "203.0.113.1".to_string(),
            created: Utc::now(),
            last_seen: Utc::now(),
            expire_ms: 1000,
            granted: Vec::new(),
        }];
        engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Sessions,
            outcome: Ok(SourcePayload::Sessions(rows)),
        });

        assert!(!engine.dashboard.sessions.loaded);
        assert!(engine.dashboard.sessions.rows.is_empty());
    }

    #[tokio::test]
    async fn select_source_switches_and_fetches_immediately() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);

        engine.handle_command(Command::SelectSource(SourceKind::Logs));

        assert_eq!(engine.dashboard.active, SourceKind::Logs);
        assert!(engine.is_fetching(SourceKind::Logs));
        assert!(!engine.pollers_idle());
    }

    #[tokio::test]
    async fn toggle_expanded_flips_view_state() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);
        engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Clients,
            outcome: Ok(SourcePayload::Clients(vec![client_record("203.0.113.1")])),
        });

        engine.handle_command(Command::ToggleExpanded("203.0.113.1".to_string()));
        assert!(engine.dashboard.clients.get("203.0.113.1").expect("client").expanded);

        engine.handle_command(Command::ToggleExpanded("203.0.113.1".to_string()));
        assert!(!engine.dashboard.clients.get("203.0.113.1").expect("client").expanded);
    }

    #[tokio::test]
    async fn delete_pauses_poller_and_success_refetches_then_resumes() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);
        engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Clients,
            outcome: Ok(SourcePayload::Clients(vec![client_record("203.0.113.1")])),
        });

        engine.handle_command(Command::DeleteClient("203.0.113.1".to_string()));
        assert!(engine.dashboard.clients.get("203.0.113.1").expect("client").deleting);
        assert!(!engine.records_poller.is_running());

        let events = engine.handle_msg(EngineMsg::DeleteFinished {
            address: "203.0.113.1".to_string(),
            outcome: Ok(DeleteOutcome { result: true }),
        });
        assert!(events.is_empty());
        assert!(engine.is_fetching(SourceKind::Clients));
        assert!(!engine.records_poller.is_running());

        engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Clients,
            outcome: Ok(SourcePayload::Clients(Vec::new())),
        });
        assert!(engine.records_poller.is_running());
        assert!(engine.dashboard.clients.is_empty());
    }

    #[tokio::test]
    async fn delete_failure_alerts_and_resumes_polling() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);
        engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Clients,
            outcome: Ok(SourcePayload::Clients(vec![client_record("203.0.113.1")])),
        });

        engine.handle_command(Command::DeleteClient("203.0.113.1".to_string()));
        let events = engine.handle_msg(EngineMsg::DeleteFinished {
            address: "203.0.113.1".to_string(),
            outcome: Err(ApiError::Status {
                status: 500,
                message: Some("removal refused".to_string()),
            }),
        });

        assert_eq!(events, vec![UiEvent::Alert("removal refused".to_string())]);
        assert!(!engine.dashboard.clients.get("203.0.113.1").expect("client").deleting);
        assert!(engine.records_poller.is_running());
    }

    #[tokio::test]
    async fn delete_rejected_by_server_surfaces_generic_alert() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);
        engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Clients,
            outcome: Ok(SourcePayload::Clients(vec![client_record("203.0.113.1")])),
        });

        engine.handle_command(Command::DeleteClient("203.0.113.1".to_string()));
        let events = engine.handle_msg(EngineMsg::DeleteFinished {
            address: "203.0.113.1".to_string(),
            outcome: Ok(DeleteOutcome { result: false }),
        });

        assert_eq!(events, vec![UiEvent::Alert(GENERIC_ALERT.to_string())]);
        assert!(engine.records_poller.is_running());
    }

    #[tokio::test]
    async fn second_login_attempt_is_ignored_while_verifying() {
        let (mut engine, _rx) = engine();

        engine.handle_command(Command::Login("hunter2".to_string()));
        assert!(engine.dashboard.gate.verifying());

        engine.handle_command(Command::Login("hunter2".to_string()));
        assert!(engine.dashboard.gate.verifying());
    }

    #[tokio::test]
    async fn logs_payload_replaces_rows_in_order() {
        let (mut engine, _rx) = engine();
        open_session(&mut engine);

        let rows = ingest_logs(vec![
            soc_core::LogRecord {
                time: Utc::now(),
                kind: "Default".to_string(),
                context: "Server".to_string(),
                message: "started".to_string(),
            },
        ]);
        engine.handle_msg(EngineMsg::SourceFetched {
            kind: SourceKind::Logs,
            outcome: Ok(SourcePayload::Logs(rows)),
        });

        assert!(engine.dashboard.logs.loaded);
        assert_eq!(engine.dashboard.logs.rows.len(), 1);
    }
}
