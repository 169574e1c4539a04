use crate::models::{ServiceRecord, ServiceStatus, UpdateEntry};
use crate::timestamps::{format_timestamp, parse_timestamp};
use chrono::NaiveDateTime;

/// Newest first. Entries whose date does not parse sink to the end,
/// keeping their relative order.
pub fn sort_updates(updates: &mut [UpdateEntry]) {
    updates.sort_by_cached_key(|entry| std::cmp::Reverse(parse_timestamp(&entry.date)));
}

pub fn append_update(
    mut record: ServiceRecord,
    text: &str,
    user: &str,
    now: NaiveDateTime,
) -> ServiceRecord {
    let stamp = format_timestamp(now);
    record.updates.push(UpdateEntry {
        text: text.to_string(),
        user: user.to_string(),
        date: stamp.clone(),
    });
    sort_updates(&mut record.updates);
    record.last_update = stamp;
    record
}

/// Status changes leave `last_update` alone; only appended entries move it.
pub fn set_status(mut record: ServiceRecord, status: ServiceStatus) -> ServiceRecord {
    record.status = status;
    record
}
