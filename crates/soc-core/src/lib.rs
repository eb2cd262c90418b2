use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientRecord {
    pub address: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub count: u64,
    #[serde(default)]
    pub marked: bool,
    #[serde(default)]
    pub records: Vec<CaptureRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CaptureRecord {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub inbound: String,
    #[serde(default)]
    pub outbound: String,
    #[serde(default)]
    pub hitting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionRecord {
    #[serde(rename = "IP")]
    pub ip: String,
    pub created: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub expire: i64,
    #[serde(default)]
    pub permissions: HashMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncTopology {
    pub server: SyncServer,
    #[serde(default)]
    pub nodes: Vec<SyncNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncServer {
    #[serde(rename = "IP")]
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub clients: Vec<SyncServerClient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncServerClient {
    pub remote: Endpoint,
    pub stats: LinkStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncNode {
    pub address: Endpoint,
    #[serde(default)]
    pub delay: i64,
    #[serde(default)]
    pub connected: bool,
    pub stats: LinkStats,
    #[serde(default, rename = "Partner")]
    pub partners: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Port")]
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinkStats {
    #[serde(rename = "RX", default)]
    pub rx: u64,
    #[serde(rename = "TX", default)]
    pub tx: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusReport {
    pub uptime: u64,
    #[serde(default)]
    pub total_inbound: u64,
    #[serde(default)]
    pub total_marked: u64,
    #[serde(default)]
    pub total_hit: u64,
    #[serde(default)]
    pub total_clients: u64,
    #[serde(default)]
    pub history: Vec<HistoryBucket>,
    #[serde(default)]
    pub distribution: Vec<DistributionSlot>,
}

impl StatusReport {
    pub fn uptime_hours(&self) -> f64 {
        self.uptime as f64 / 3_600_000_000_000.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryBucket {
    pub hours: u64,
    #[serde(default)]
    pub inbound: u64,
    #[serde(default)]
    pub marked: u64,
    #[serde(default)]
    pub hit: u64,
}

impl HistoryBucket {
    pub fn empty(hours: u64) -> Self {
        Self {
            hours,
            inbound: 0,
            marked: 0,
            hit: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DistributionSlot {
    pub port: u16,
    #[serde(rename = "Type")]
    pub kind: String,
    pub hit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthGrant {
    pub token: String,
    #[serde(default)]
    pub permissions: HashMap<String, bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteOutcome {
    pub result: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    pub error: String,
}
