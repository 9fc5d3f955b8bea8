use chrono::{DateTime, Utc};

/// Order number from the wall clock: `prefix` plus the last six digits of
/// the Unix time in milliseconds. Two orders within the same millisecond
/// (or exactly 1000 seconds apart) collide; nothing enforces uniqueness.
pub fn order_number(prefix: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    format!("{}{:06}", prefix, millis)
}
