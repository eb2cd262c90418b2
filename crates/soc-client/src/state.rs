use crate::reconcile::ClientDirectory;
use crate::session::SessionGate;
use crate::source::{LogRow, SessionRow, SourceKind, SourcePayload, SyncView};
use soc_core::stats::{self, DistributionEntry};
use soc_core::{HistoryBucket, StatusReport};

pub const HISTORY_CHART_LENGTH: usize = 12;
pub const DISTRIBUTION_MAX_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOverview {
    pub synced: bool,
    pub total_inbound: u64,
    pub total_marked: u64,
    pub total_hit: u64,
    pub total_clients: u64,
    pub uptime_hours: u64,
}

#[derive(Debug, Clone, Default)]
pub struct HistorySeries {
    pub labels: Vec<u64>,
    pub hit: Vec<u64>,
    pub inbound: Vec<u64>,
    pub marked: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct DistributionSeries {
    pub labels: Vec<String>,
    pub percents: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ChartSet {
    pub history: HistorySeries,
    pub distribution: DistributionSeries,
}

impl ChartSet {
    pub fn reset(&mut self) {
        let baseline: Vec<HistoryBucket> = (1..=HISTORY_CHART_LENGTH as u64)
            .rev()
            .map(HistoryBucket::empty)
            .collect();
        self.update_history(&baseline);
        self.distribution = DistributionSeries::default();
    }

    pub fn update_history(&mut self, binned: &[HistoryBucket]) {
        self.history = HistorySeries {
            labels: binned.iter().map(|b| b.hours).collect(),
            hit: binned.iter().map(|b| b.hit).collect(),
            inbound: binned.iter().map(|b| b.inbound).collect(),
            marked: binned.iter().map(|b| b.marked).collect(),
        };
    }

    pub fn update_distribution(&mut self, entries: &[DistributionEntry]) {
        self.distribution = DistributionSeries {
            labels: entries.iter().map(|e| e.label.clone()).collect(),
            percents: entries.iter().map(|e| e.percent).collect(),
        };
    }
}

#[derive(Debug)]
pub struct SourceTable<T> {
    pub rows: Vec<T>,
    pub loaded: bool,
}

impl<T> Default for SourceTable<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            loaded: false,
        }
    }
}

impl<T> SourceTable<T> {
    pub fn replace(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.loaded = true;
    }
}

#[derive(Debug, Default)]
pub struct SyncPanel {
    pub view: SyncView,
    pub loaded: bool,
}

impl SyncPanel {
    pub fn replace(&mut self, view: SyncView) {
        self.view = view;
        self.loaded = true;
    }
}

#[derive(Debug, Default)]
pub struct Dashboard {
    pub gate: SessionGate,
    pub active: SourceKind,
    pub clients: ClientDirectory,
    pub sessions: SourceTable<SessionRow>,
    pub sync: SyncPanel,
    pub logs: SourceTable<LogRow>,
    pub overview: StatusOverview,
    pub charts: ChartSet,
    pub show_loading: bool,
}

impl Dashboard {
    pub fn new() -> Self {
        let mut dashboard = Self::default();
        dashboard.charts.reset();
        dashboard
    }

    pub fn source_loaded(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Clients => self.clients.loaded,
            SourceKind::Sessions => self.sessions.loaded,
            SourceKind::Sync => self.sync.loaded,
            SourceKind::Logs => self.logs.loaded,
        }
    }

    pub fn apply_payload(&mut self, payload: SourcePayload) {
        match payload {
            SourcePayload::Clients(batch) => {
                self.clients.reconcile(batch);
                self.clients.loaded = true;
                self.overview.total_clients = self.clients.len() as u64;
            }
            SourcePayload::Sessions(rows) => self.sessions.replace(rows),
            SourcePayload::Sync(view) => self.sync.replace(view),
            SourcePayload::Logs(rows) => self.logs.replace(rows),
        }
    }

    pub fn apply_status(&mut self, report: &StatusReport) {
        let uptime_hours = report.uptime_hours();

        self.overview.synced = true;
        self.overview.total_inbound = report.total_inbound;
        self.overview.total_marked = report.total_marked;
        self.overview.total_hit = report.total_hit;
        self.overview.total_clients = report.total_clients;
        self.overview.uptime_hours = uptime_hours.round() as u64;

        let binned = stats::bin_history(
            &report.history,
            HISTORY_CHART_LENGTH,
            uptime_hours.ceil() as u64,
        );
        self.charts.update_history(&binned);

        let entries = stats::top_n_distribution(&report.distribution, DISTRIBUTION_MAX_ITEMS);
        self.charts.update_distribution(&entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soc_core::DistributionSlot;

    fn report() -> StatusReport {
        StatusReport {
            uptime: 12_600_000_000_000,
            total_inbound: 120,
            total_marked: 12,
            total_hit: 30,
            total_clients: 9,
            history: vec![HistoryBucket {
                hours: 3,
                inbound: 40,
                marked: 4,
                hit: 10,
            }],
            distribution: vec![
                DistributionSlot {
                    port: 22,
                    kind: "tcp".to_string(),
                    hit: 3,
                },
                DistributionSlot {
                    port: 53,
                    kind: "udp".to_string(),
                    hit: 1,
                },
            ],
        }
    }

    #[test]
    fn chart_reset_produces_blank_twelve_hour_baseline() {
        let mut charts = ChartSet::default();
        charts.reset();

        assert_eq!(charts.history.labels.len(), HISTORY_CHART_LENGTH);
        assert_eq!(charts.history.labels[0], 12);
        assert_eq!(charts.history.labels[HISTORY_CHART_LENGTH - 1], 1);
        assert!(charts.history.hit.iter().all(|&v| v == 0));
        assert!(charts.distribution.labels.is_empty());
    }

    #[test]
    fn apply_status_updates_overview_and_charts() {
        let mut dashboard = Dashboard::new();

        dashboard.apply_status(&report());

        assert!(dashboard.overview.synced);
        assert_eq!(dashboard.overview.total_inbound, 120);
        assert_eq!(dashboard.overview.uptime_hours, 4);
        assert_eq!(dashboard.charts.history.labels.len(), HISTORY_CHART_LENGTH);
        assert_eq!(dashboard.charts.history.labels[0], 4);
        assert_eq!(dashboard.charts.history.inbound[1], 40);
        assert_eq!(dashboard.charts.distribution.labels, vec!["tcp 22", "udp 53"]);
    }

    #[test]
    fn apply_clients_payload_updates_total_count() {
        let mut dashboard = Dashboard::new();
        let batch = vec![soc_core::ClientRecord {
            address: "203.0.113.9".to_string(),
            first_seen: chrono::Utc::now(),
            last_seen: chrono::Utc::now(),
            count: 2,
            marked: false,
            records: Vec::new(),
        }];

        dashboard.apply_payload(SourcePayload::Clients(batch));

        assert!(dashboard.clients.loaded);
        assert!(dashboard.source_loaded(SourceKind::Clients));
        assert_eq!(dashboard.overview.total_clients, 1);
    }

    #[test]
    fn source_loaded_tracks_each_kind_independently() {
        let mut dashboard = Dashboard::new();

        dashboard.apply_payload(SourcePayload::Logs(Vec::new()));

        assert!(dashboard.source_loaded(SourceKind::Logs));
        assert!(!dashboard.source_loaded(SourceKind::Sessions));
        assert!(!dashboard.source_loaded(SourceKind::Sync));
    }
}
