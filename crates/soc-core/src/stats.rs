use crate::{DistributionSlot, HistoryBucket};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const REST_LABEL: &str = "Rest";

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionEntry {
    pub label: String,
    pub percent: f64,
}

pub fn bin_history(buckets: &[HistoryBucket], length: usize, current_hour: u64) -> Vec<HistoryBucket> {
    let mut by_hour: BTreeMap<u64, HistoryBucket> = BTreeMap::new();
    let mut max_hour = 0u64;

    for bucket in buckets {
        if bucket.hours > max_hour {
            max_hour = bucket.hours;
        }
        by_hour.insert(bucket.hours, *bucket);
    }

    if current_hour > max_hour {
        max_hour = current_hour;
    }

    let mut result = Vec::with_capacity(length);
    let mut hour = max_hour;
    while hour > 0 && result.len() < length {
        result.push(
            by_hour
                .get(&hour)
                .copied()
                .unwrap_or_else(|| HistoryBucket::empty(hour)),
        );
        hour -= 1;
    }

    while result.len() < length {
        result.push(HistoryBucket::empty(0));
    }

    result
}

pub fn top_n_distribution(slots: &[DistributionSlot], max_items: usize) -> Vec<DistributionEntry> {
    let mut grouped: BTreeMap<(String, u16), u64> = BTreeMap::new();
    let mut total = 0u64;

    for slot in slots {
        *grouped
            .entry((slot.kind.clone(), slot.port))
            .or_insert(0) += slot.hit;
        total += slot.hit;
    }

    if total == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<DistributionEntry> = grouped
        .into_iter()
        .map(|((kind, port), hits)| DistributionEntry {
            label: format!("{kind} {port}"),
            percent: (hits as f64 / total as f64) * 100.0,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.percent
            .partial_cmp(&a.percent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });

    let mut result: Vec<DistributionEntry> = Vec::with_capacity(max_items + 1);
    for entry in ranked {
        if result.len() < max_items {
            result.push(entry);
        } else if result.len() == max_items {
            result.push(DistributionEntry {
                label: REST_LABEL.to_string(),
                percent: entry.percent,
            });
        } else {
            result[max_items].percent += entry.percent;
        }
    }

    result
}
