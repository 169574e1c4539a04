use crate::models::{ListServicesRequest, ServiceFilter, ServiceMap, ServiceRecord, ServiceSort};
use crate::timestamps::{parse_date, parse_timestamp};
use chrono::NaiveDateTime;
use std::cmp::Reverse;

pub fn list_services(store: &ServiceMap, request: &ListServicesRequest) -> Vec<ServiceRecord> {
    let query = request.query.trim().to_lowercase();
    let mut matches: Vec<ServiceRecord> = store
        .values()
        .filter(|record| matches_filter(record, request.filter, &query))
        .cloned()
        .collect();
    sort_services(&mut matches, request.sort);
    matches
}

fn matches_filter(record: &ServiceRecord, filter: ServiceFilter, query: &str) -> bool {
    let address = record.address.to_lowercase();
    match filter {
        ServiceFilter::All => {
            query.is_empty()
                || [&record.title, &record.description, &record.address, &record.service_type]
                    .iter()
                    .any(|field| field.to_lowercase().contains(query))
        }
        ServiceFilter::Bairro => address.contains(query) && address.contains("bairro"),
        ServiceFilter::Rua => {
            address.contains(query) && (address.contains("rua") || address.contains("av"))
        }
        ServiceFilter::Tipo => record.service_type.to_lowercase().contains(query),
    }
}

/// Newest first; records whose date does not parse go last.
pub fn sort_services(records: &mut [ServiceRecord], sort: ServiceSort) {
    records.sort_by_cached_key(|record| Reverse(sort_key(record, sort)));
}

fn sort_key(record: &ServiceRecord, sort: ServiceSort) -> Option<NaiveDateTime> {
    match sort {
        ServiceSort::Created => parse_date(&record.date).and_then(|date| date.and_hms_opt(0, 0, 0)),
        ServiceSort::LastUpdate => parse_timestamp(&record.last_update),
    }
}
