use chrono::{DateTime, Utc};

pub fn ago(from: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed_ms = now.signed_duration_since(from).num_milliseconds().max(0);

    let scales: [(i64, &str, &str); 6] = [
        (31_104_000_000, "year", "years"),
        (2_592_000_000, "month", "months"),
        (86_400_000, "day", "days"),
        (3_600_000, "hour", "hours"),
        (60_000, "minute", "minutes"),
        (1_000, "second", "seconds"),
    ];

    for (unit, singular, plural) in scales {
        if elapsed_ms >= unit {
            let n = (elapsed_ms as f64 / unit as f64).round() as i64;
            let label = if n == 1 { singular } else { plural };
            return format!("{n} {label} ago");
        }
    }

    "just now".to_string()
}

pub fn bytes(count: u64) -> String {
    if count == 0 {
        return "0B".to_string();
    }

    let scales: [(u64, &str); 3] = [(1_073_741_824, "GiB"), (1_048_576, "MiB"), (1_024, "KiB")];
    for (unit, suffix) in scales {
        if count >= unit {
            let n = (count as f64 / unit as f64).round() as u64;
            return format!("{n}{suffix}");
        }
    }

    format!("{count}B")
}

pub fn duration_ms(ms: i64) -> String {
    if ms <= 0 {
        return "n/a".to_string();
    }

    let scales: [(i64, &str); 3] = [(3_600_000, "h"), (60_000, "m"), (1_000, "s")];
    for (unit, suffix) in scales {
        if ms >= unit {
            let n = (ms as f64 / unit as f64).round() as i64;
            return format!("{n}{suffix}");
        }
    }

    format!("{ms}ms")
}

pub fn clock(time: DateTime<Utc>) -> String {
    time.format("%H:%M:%S").to_string()
}

pub fn day(time: DateTime<Utc>) -> String {
    time.format("%b %d, %Y").to_string()
}
