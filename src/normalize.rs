use crate::models::{
    ServiceRecord, ServiceStatus, UpdateEntry, DEFAULT_IMAGE, DEFAULT_SERVICE_TYPE,
};
use crate::timestamps::midnight_of;
use crate::updates::sort_updates;
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_ID: &str = "000AAA";
pub const PLACEHOLDER_DESCRIPTION: &str = "Descrição não disponível";
pub const PLACEHOLDER_ADDRESS: &str = "Endereço não disponível";
pub const PLACEHOLDER_DATE: &str = "01/01/2023";

/// One value of the services document, in either of the shapes it has had.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRecord {
    /// Early builds stored only the update list under the title.
    Legacy(Vec<UpdateEntry>),
    Current(Box<RawServiceRecord>),
}

impl StoredRecord {
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }
}

impl From<ServiceRecord> for StoredRecord {
    fn from(record: ServiceRecord) -> Self {
        Self::Current(Box::new(RawServiceRecord {
            id: Some(record.id),
            title: Some(record.title),
            description: Some(record.description),
            date: Some(record.date),
            address: Some(record.address),
            image: Some(record.image),
            status: Some(record.status.as_str().to_string()),
            service_type: Some(record.service_type),
            last_update: Some(record.last_update),
            cep: record.cep,
            updates: Some(record.updates),
        }))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawServiceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<Vec<UpdateEntry>>,
}

/// Builds the canonical record stored under `title`, backfilling every
/// missing field. The map key wins over any embedded title.
pub fn normalize(title: &str, stored: StoredRecord) -> ServiceRecord {
    let raw = match stored {
        StoredRecord::Legacy(updates) => {
            tracing::info!(
                title = %title,
                updates = updates.len(),
                "converting list-shaped record"
            );
            RawServiceRecord {
                updates: Some(updates),
                ..RawServiceRecord::default()
            }
        }
        StoredRecord::Current(raw) => *raw,
    };

    let status = match raw.status.as_deref() {
        None => ServiceStatus::default(),
        Some(label) => label.parse().unwrap_or_else(|error| {
            tracing::warn!(
                title = %title,
                error = %error,
                "unknown stored status; resetting to pending"
            );
            ServiceStatus::default()
        }),
    };

    let date = raw.date.unwrap_or_else(|| PLACEHOLDER_DATE.to_string());
    let last_update = raw.last_update.unwrap_or_else(|| midnight_of(&date));
    let mut updates = raw.updates.unwrap_or_default();
    sort_updates(&mut updates);

    ServiceRecord {
        id: raw.id.unwrap_or_else(|| PLACEHOLDER_ID.to_string()),
        title: title.to_string(),
        description: raw
            .description
            .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string()),
        date,
        address: raw.address.unwrap_or_else(|| PLACEHOLDER_ADDRESS.to_string()),
        image: raw.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        status,
        service_type: raw
            .service_type
            .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string()),
        last_update,
        cep: raw.cep,
        updates,
    }
}
