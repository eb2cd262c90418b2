use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use soc_core::{CaptureRecord, ClientRecord};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureDetail {
    pub time: DateTime<Utc>,
    pub request: String,
    pub response: String,
    pub hitting: bool,
}

#[derive(Debug, Clone)]
pub struct TrackedClient {
    pub address: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub count: u64,
    pub marked: bool,
    pub records: Vec<CaptureRecord>,
    pub expanded: bool,
    pub deleting: bool,
    pub detail: Vec<CaptureDetail>,
}

impl TrackedClient {
    fn from_record(record: ClientRecord) -> Self {
        Self {
            address: record.address,
            first_seen: record.first_seen,
            last_seen: record.last_seen,
            count: record.count,
            marked: record.marked,
            records: record.records,
            expanded: false,
            deleting: false,
            detail: Vec::new(),
        }
    }

    pub fn expand(&mut self) {
        self.detail = materialize_detail(&self.records);
        self.expanded = true;
    }

    pub fn collapse(&mut self) {
        self.expanded = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub address: String,
    pub last_seen: DateTime<Utc>,
    pub count: u64,
}

#[derive(Debug, Default)]
pub struct ClientDirectory {
    clients: HashMap<String, TrackedClient>,
    order: Vec<OrderKey>,
    pub loaded: bool,
}

impl ClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&TrackedClient> {
        self.clients.get(address)
    }

    pub fn get_mut(&mut self, address: &str) -> Option<&mut TrackedClient> {
        self.clients.get_mut(address)
    }

    pub fn order(&self) -> &[OrderKey] {
        &self.order
    }

    pub fn ordered(&self) -> impl Iterator<Item = &TrackedClient> {
        self.order.iter().filter_map(|key| self.clients.get(&key.address))
    }

    pub fn reconcile(&mut self, batch: Vec<ClientRecord>) {
        self.order.clear();
        self.order.reserve(batch.len());

        for record in batch {
            self.order.push(OrderKey {
                address: record.address.clone(),
                last_seen: record.last_seen,
                count: record.count,
            });

            match self.clients.get_mut(&record.address) {
                Some(existing) => {
                    existing.last_seen = record.last_seen;
                    existing.count = record.count;
                    existing.marked = record.marked;
                    existing.records = record.records;
                    if existing.expanded {
                        existing.detail = materialize_detail(&existing.records);
                    }
                }
                None => {
                    self.clients
                        .insert(record.address.clone(), TrackedClient::from_record(record));
                }
            }
        }

        self.order.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.last_seen.cmp(&a.last_seen))
                .then_with(|| a.address.cmp(&b.address))
        });

        let kept: HashSet<&str> = self.order.iter().map(|key| key.address.as_str()).collect();
        self.clients.retain(|address, _| kept.contains(address.as_str()));
    }
}

pub fn materialize_detail(records: &[CaptureRecord]) -> Vec<CaptureDetail> {
    records
        .iter()
        .rev()
        .map(|record| CaptureDetail {
            time: record.time,
            request: decode_payload(&record.inbound),
            response: decode_payload(&record.outbound),
            hitting: record.hitting,
        })
        .collect()
}

fn decode_payload(encoded: &str) -> String {
    BASE64
        .decode(encoded)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 9, minute, 0).single().expect("valid timestamp")
    }

    fn record(address: &str, count: u64, last_seen_minute: u32) -> ClientRecord {
        ClientRecord {
            address: address.to_string(),
            first_seen: ts(0),
            last_seen: ts(last_seen_minute),
            count,
            marked: false,
            records: Vec::new(),
        }
    }

    fn capture(minute: u32, inbound: &str, hitting: bool) -> CaptureRecord {
        CaptureRecord {
            time: ts(minute),
            inbound: BASE64.encode(inbound),
            outbound: BASE64.encode("ok"),
            hitting,
        }
    }

    fn addresses(directory: &ClientDirectory) -> Vec<&str> {
        directory.order().iter().map(|key| key.address.as_str()).collect()
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut directory = ClientDirectory::new();
        let batch = vec![record("a", 5, 1), record("b", 3, 2)];

        directory.reconcile(batch.clone());
        let first_order: Vec<String> =
            directory.order().iter().map(|key| key.address.clone()).collect();

        directory.reconcile(batch);

        assert_eq!(directory.len(), 2);
        let second_order: Vec<String> =
            directory.order().iter().map(|key| key.address.clone()).collect();
        assert_eq!(first_order, second_order);
    }

    #[test]
    fn absent_clients_are_deleted() {
        let mut directory = ClientDirectory::new();
        directory.reconcile(vec![record("a", 1, 1), record("b", 1, 1), record("c", 1, 1)]);

        directory.reconcile(vec![record("a", 1, 2), record("c", 1, 2)]);

        assert_eq!(directory.len(), 2);
        assert!(directory.get("a").is_some());
        assert!(directory.get("b").is_none());
        assert!(directory.get("c").is_some());
    }

    #[test]
    fn expanded_state_survives_and_detail_follows_new_records() {
        let mut directory = ClientDirectory::new();
        let mut first = record("a", 1, 1);
        first.records = vec![capture(1, "first probe", false)];
        directory.reconcile(vec![first]);

        directory.get_mut("a").expect("client a").expand();
        assert_eq!(directory.get("a").expect("client a").detail[0].request, "first probe");

        let mut second = record("a", 2, 2);
        second.records = vec![capture(1, "first probe", false), capture(2, "second probe", true)];
        directory.reconcile(vec![second]);

        let client = directory.get("a").expect("client a");
        assert!(client.expanded);
        assert_eq!(client.detail.len(), 2);
        assert_eq!(client.detail[0].request, "second probe");
        assert!(client.detail[0].hitting);
    }

    #[test]
    fn collapsed_clients_do_not_materialize_detail() {
        let mut directory = ClientDirectory::new();
        let mut incoming = record("a", 1, 1);
        incoming.records = vec![capture(1, "probe", false)];

        directory.reconcile(vec![incoming]);

        let client = directory.get("a").expect("client a");
        assert!(!client.expanded);
        assert!(client.detail.is_empty());
    }

    #[test]
    fn deleting_flag_is_preserved_across_reconciles() {
        let mut directory = ClientDirectory::new();
        directory.reconcile(vec![record("a", 1, 1)]);
        directory.get_mut("a").expect("client a").deleting = true;

        directory.reconcile(vec![record("a", 2, 2)]);

        assert!(directory.get("a").expect("client a").deleting);
    }

    #[test]
    fn first_seen_is_never_overwritten() {
        let mut directory = ClientDirectory::new();
        directory.reconcile(vec![record("a", 1, 1)]);
        let original = directory.get("a").expect("client a").first_seen;

        let mut update = record("a", 2, 5);
        update.first_seen = ts(30);
        directory.reconcile(vec![update]);

        assert_eq!(directory.get("a").expect("client a").first_seen, original);
    }

    #[test]
    fn ordering_is_count_desc_then_last_seen_desc_then_address_asc() {
        let mut directory = ClientDirectory::new();
        directory.reconcile(vec![
            record("c", 3, 5),
            record("b", 5, 5),
            record("a", 5, 5),
            record("d", 5, 9),
        ]);

        assert_eq!(addresses(&directory), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn order_and_map_agree_after_reconcile() {
        let mut directory = ClientDirectory::new();
        directory.reconcile(vec![record("a", 1, 1), record("b", 2, 2)]);
        directory.reconcile(vec![record("b", 3, 3), record("c", 1, 1)]);

        let ordered: Vec<&str> = directory.ordered().map(|c| c.address.as_str()).collect();
        assert_eq!(ordered.len(), directory.len());
        assert!(ordered.contains(&"b"));
        assert!(ordered.contains(&"c"));
        assert!(!ordered.contains(&"a"));
    }

    #[test]
    fn detail_is_newest_first_with_decoded_payloads() {
        let captures = vec![capture(1, "GET / HTTP/1.1", false), capture(2, "QUIT", true)];

        let detail = materialize_detail(&captures);

        assert_eq!(detail[0].request, "QUIT");
        assert_eq!(detail[1].request, "GET / HTTP/1.1");
        assert_eq!(detail[0].response, "ok");
    }

    #[test]
    fn undecodable_payloads_become_empty_text() {
        let captures = vec![CaptureRecord {
            time: ts(1),
            inbound: "not-base64!".to_string(),
            outbound: String::new(),
            hitting: false,
        }];

        let detail = materialize_detail(&captures);

        assert_eq!(detail[0].request, "");
        assert_eq!(detail[0].response, "");
    }
}
