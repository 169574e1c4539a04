use crate::models::{NotificationItem, ServiceMap};
use crate::timestamps::parse_timestamp;

/// Flattens the update logs of every followed record into one feed,
/// newest first. Recomputed from the store on every call.
pub fn project_notifications(seguindo: &[String], store: &ServiceMap) -> Vec<NotificationItem> {
    let mut feed: Vec<NotificationItem> = store
        .values()
        .filter(|record| seguindo.iter().any(|id| id == &record.id))
        .flat_map(|record| {
            record.updates.iter().map(move |entry| NotificationItem {
                id: record.id.clone(),
                title: record.title.clone(),
                text: entry.text.clone(),
                user: entry.user.clone(),
                date: entry.date.clone(),
            })
        })
        .collect();
    feed.sort_by_cached_key(|item| std::cmp::Reverse(parse_timestamp(&item.date)));
    feed
}
