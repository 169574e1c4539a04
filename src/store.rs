use crate::errors::{AppError, AppResult};
use crate::ids::generate_id;
use crate::models::{MigrationReport, ServiceMap, ServiceRecord};
use crate::normalize::{normalize, StoredRecord, PLACEHOLDER_ID};
use crate::persistence::{read_json_document, read_json_or_default, write_json_atomic};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The services document: one JSON object mapping title to record,
/// loaded and rewritten whole on every mutation.
///
/// Entries that fit neither record shape are invisible to readers but are
/// written back untouched by every save. A document that does not parse at
/// all is never overwritten.
///
/// There is no cross-process locking. Two writers interleaving a
/// load/save pair lose one of the updates.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_all(&self) -> ServiceMap {
        self.load_with_report().0
    }

    pub fn save_all(&self, records: &ServiceMap) -> AppResult<()> {
        let mut document = self.unparsed_entries()?;
        let kept = document.len();
        for (title, record) in records {
            document.insert(title.clone(), serde_json::to_value(record)?);
        }
        write_json_atomic(&self.path, &document)?;
        tracing::debug!(
            path = %self.path.to_string_lossy(),
            records = records.len(),
            kept_unparsed = kept,
            "services document written"
        );
        Ok(())
    }

    pub fn upsert(&self, title: &str, mut record: ServiceRecord) -> AppResult<()> {
        let mut records = self.load_all();
        record.title = title.to_string();
        records.insert(title.to_string(), record);
        self.save_all(&records)
    }

    /// True when any entry, readable or not, sits under `title`.
    pub fn contains_title(&self, title: &str) -> bool {
        let document: Map<String, Value> = read_json_or_default(&self.path);
        document.contains_key(title)
    }

    pub fn find_by_id(&self, id: &str) -> Option<ServiceRecord> {
        self.load_all().into_values().find(|record| record.id == id)
    }

    pub fn get_required(&self, id: &str) -> AppResult<ServiceRecord> {
        self.find_by_id(id)
            .ok_or_else(|| AppError::NotFound(format!("service '{}' not found", id)))
    }

    pub fn existing_ids(&self) -> HashSet<String> {
        self.load_all().into_values().map(|record| record.id).collect()
    }

    /// A report with the same CEP and service type already on file.
    pub fn find_duplicate(&self, cep: &str, service_type: &str) -> Option<ServiceRecord> {
        find_duplicate_in(&self.load_all(), cep, service_type).cloned()
    }

    pub fn remove_by_id(&self, id: &str) -> AppResult<ServiceRecord> {
        let mut records = self.load_all();
        let title = records
            .iter()
            .find(|(_, record)| record.id == id)
            .map(|(title, _)| title.clone())
            .ok_or_else(|| AppError::NotFound(format!("service '{}' not found", id)))?;
        let removed = records
            .remove(&title)
            .ok_or_else(|| {
                AppError::Internal(format!("service '{}' vanished during removal", id))
            })?;
        self.save_all(&records)?;
        Ok(removed)
    }

    /// Persists normalized shapes for every record and replaces placeholder
    /// ids with generated ones. Reads never write, so legacy entries stay on
    /// disk until this or another save runs.
    pub fn migrate(&self) -> AppResult<MigrationReport> {
        let (mut records, mut changed) = self.load_with_report();
        let mut taken: HashSet<String> = records.values().map(|record| record.id.clone()).collect();
        taken.insert(PLACEHOLDER_ID.to_string());
        for (title, record) in records.iter_mut() {
            if record.id != PLACEHOLDER_ID {
                continue;
            }
            record.id = generate_id(&taken);
            taken.insert(record.id.clone());
            tracing::info!(title = %title, id = %record.id, "assigned id to record without one");
            changed.insert(title.clone());
        }

        if !changed.is_empty() {
            self.save_all(&records)?;
            tracing::info!(
                path = %self.path.to_string_lossy(),
                migrated = changed.len(),
                "services document migrated"
            );
        }
        Ok(MigrationReport {
            records: records.len(),
            migrated: changed.len(),
        })
    }

    /// Normalized records plus the titles whose stored shape differs from
    /// what a save would write.
    fn load_with_report(&self) -> (ServiceMap, HashSet<String>) {
        let document: Map<String, Value> = read_json_or_default(&self.path);
        let mut records = ServiceMap::new();
        let mut changed = HashSet::new();
        for (title, value) in document {
            let stored = match serde_json::from_value::<StoredRecord>(value.clone()) {
                Ok(stored) => stored,
                Err(error) => {
                    tracing::warn!(
                        title = %title,
                        error = %error,
                        "skipping malformed service record"
                    );
                    continue;
                }
            };
            let record = normalize(&title, stored);
            if serde_json::to_value(&record).ok().as_ref() != Some(&value) {
                changed.insert(title.clone());
            }
            records.insert(title, record);
        }
        (records, changed)
    }

    fn unparsed_entries(&self) -> AppResult<Map<String, Value>> {
        let document: Map<String, Value> = read_json_document(&self.path)?.unwrap_or_default();
        Ok(document
            .into_iter()
            .filter(|(_, value)| serde_json::from_value::<StoredRecord>(value.clone()).is_err())
            .collect())
    }
}

/// Same CEP (digits only) and same service type. A blank CEP never matches.
pub fn find_duplicate_in<'a>(
    records: &'a ServiceMap,
    cep: &str,
    service_type: &str,
) -> Option<&'a ServiceRecord> {
    let cep = digits(cep);
    if cep.is_empty() {
        return None;
    }
    let service_type = service_type.trim();
    records.values().find(|record| {
        record.service_type.trim() == service_type
            && record.cep.as_deref().map(digits).as_deref() == Some(cep.as_str())
    })
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
