use chrono::{DateTime, Utc};
use soc_core::{ClientRecord, LogRecord, SessionRecord, SyncTopology};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceKind {
    #[default]
    Clients,
    Sessions,
    Sync,
    Logs,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Clients,
        SourceKind::Sessions,
        SourceKind::Sync,
        SourceKind::Logs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Clients => "clients",
            SourceKind::Sessions => "sessions",
            SourceKind::Sync => "sync",
            SourceKind::Logs => "logs",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub ip: String,
    pub created: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub expire_ms: i64,
    pub granted: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Initiative,
    Passive,
}

impl LinkRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkRole::Initiative => "initiative",
            LinkRole::Passive => "passive",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeerRow {
    pub ip: String,
    pub port: u16,
    pub delay: Option<i64>,
    pub rx: u64,
    pub tx: u64,
    pub connected: bool,
    pub role: LinkRole,
}

impl PeerRow {
    pub fn weight(&self) -> u64 {
        self.rx + self.tx
    }
}

#[derive(Debug, Clone)]
pub struct IndirectRow {
    pub ip: String,
    pub port: u16,
    pub via_ip: String,
    pub via_port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct SyncView {
    pub server_ip: String,
    pub server_port: u16,
    pub partners: Vec<PeerRow>,
    pub indirects: Vec<IndirectRow>,
}

#[derive(Debug, Clone)]
pub struct LogRow {
    pub time: DateTime<Utc>,
    pub kind: String,
    pub context: String,
    pub message: String,
}

#[derive(Debug)]
pub enum SourcePayload {
    Clients(Vec<ClientRecord>),
    Sessions(Vec<SessionRow>),
    Sync(SyncView),
    Logs(Vec<LogRow>),
}

impl SourcePayload {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourcePayload::Clients(_) => SourceKind::Clients,
            SourcePayload::Sessions(_) => SourceKind::Sessions,
            SourcePayload::Sync(_) => SourceKind::Sync,
            SourcePayload::Logs(_) => SourceKind::Logs,
        }
    }
}

pub fn ingest_sessions(records: Vec<SessionRecord>) -> Vec<SessionRow> {
    let mut rows: Vec<SessionRow> = records
        .into_iter()
        .map(|record| {
            let mut granted: Vec<String> = record
                .permissions
                .iter()
                .filter(|(_, allowed)| **allowed)
                .map(|(name, _)| name.clone())
                .collect();
            granted.sort();

            SessionRow {
                ip: record.ip,
                created: record.created,
                last_seen: record.last_seen,
                expire_ms: record.expire / 1_000_000,
                granted,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    rows
}

pub fn ingest_sync(topology: SyncTopology) -> SyncView {
    let mut partners = Vec::new();
    let mut indirects = Vec::new();

    for node in &topology.nodes {
        partners.push(PeerRow {
            ip: node.address.ip.clone(),
            port: node.address.port,
            delay: Some(node.delay / 1_000_000),
            rx: node.stats.rx,
            tx: node.stats.tx,
            connected: node.connected,
            role: LinkRole::Initiative,
        });

        for partner in &node.partners {
            indirects.push(IndirectRow {
                ip: partner.ip.clone(),
                port: partner.port,
                via_ip: node.address.ip.clone(),
                via_port: node.address.port,
            });
        }
    }

    for client in &topology.server.clients {
        partners.push(PeerRow {
            ip: client.remote.ip.clone(),
            port: client.remote.port,
            delay: None,
            rx: client.stats.rx,
            tx: client.stats.tx,
            connected: true,
            role: LinkRole::Passive,
        });
    }

    partners.sort_by(|a, b| {
        b.connected
            .cmp(&a.connected)
            .then_with(|| b.weight().cmp(&a.weight()))
            .then_with(|| a.ip.cmp(&b.ip))
            .then_with(|| a.port.cmp(&b.port))
    });

    indirects.sort_by(|a, b| {
        a.via_ip
            .cmp(&b.via_ip)
            .then_with(|| a.via_port.cmp(&b.via_port))
            .then_with(|| a.ip.cmp(&b.ip))
            .then_with(|| a.port.cmp(&b.port))
    });

    SyncView {
        server_ip: topology.server.ip,
        server_port: topology.server.port,
        partners,
        indirects,
    }
}

pub fn ingest_logs(records: Vec<LogRecord>) -> Vec<LogRow> {
    let mut rows: Vec<LogRow> = records
        .into_iter()
        .map(|record| LogRow {
            time: record.time,
            kind: record.kind,
            context: record.context,
            message: record.message,
        })
        .collect();

    rows.sort_by(|a, b| b.time.cmp(&a.time));
    rows
}
