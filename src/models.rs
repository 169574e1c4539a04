use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const DEFAULT_IMAGE: &str = "images/default.png";
pub const DEFAULT_SERVICE_TYPE: &str = "Serviço Geral";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServiceStatus {
    #[default]
    #[serde(rename = "Em análise")]
    Pending,
    #[serde(rename = "Em andamento")]
    InProgress,
    #[serde(rename = "Concluída")]
    Resolved,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 3] = [Self::Pending, Self::InProgress, Self::Resolved];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Em análise",
            Self::InProgress => "Em andamento",
            Self::Resolved => "Concluída",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| {
                status.as_str() == trimmed || status.slug().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown status '{}', expected one of: {}",
                    trimmed,
                    Self::ALL.map(|status| status.as_str()).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntry {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub date: String,
}

/// A citizen-submitted service report as kept in `services_updates.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Creation date, `DD/MM/YYYY`.
    pub date: String,
    pub address: String,
    pub image: String,
    pub status: ServiceStatus,
    #[serde(rename = "type")]
    pub service_type: String,
    /// `DD/MM/YYYY HH:MM`
    pub last_update: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(default)]
    pub updates: Vec<UpdateEntry>,
}

/// Records keyed by title, the on-disk layout of the store.
pub type ServiceMap = BTreeMap<String, ServiceRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub cpf: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default)]
    pub senha: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub seguindo: Vec<String>,
}

impl UserAccount {
    pub fn follows(&self, service_id: &str) -> bool {
        self.seguindo.iter().any(|id| id == service_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub text: String,
    pub user: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub title: String,
    pub description: String,
    pub address: String,
    pub number: String,
    pub bairro: String,
    pub service_type: String,
    pub cep: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub telefone: String,
    pub cpf: String,
    pub cep: String,
    pub bairro: String,
    pub senha: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserRequest {
    pub cpf: String,
    pub username: Option<String>,
    pub bairro: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceFilter {
    #[default]
    All,
    Bairro,
    Rua,
    Tipo,
}

impl FromStr for ServiceFilter {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "todos" => Ok(Self::All),
            "bairro" => Ok(Self::Bairro),
            "rua" => Ok(Self::Rua),
            "tipo" | "type" => Ok(Self::Tipo),
            other => Err(AppError::Validation(format!("unknown filter '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceSort {
    Created,
    #[default]
    LastUpdate,
}

impl FromStr for ServiceSort {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "last-update" | "last_update" => Ok(Self::LastUpdate),
            other => Err(AppError::Validation(format!("unknown sort '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListServicesRequest {
    pub query: String,
    pub filter: ServiceFilter,
    pub sort: ServiceSort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub records: usize,
    pub migrated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub services_file: String,
    pub users_file: String,
    pub default_image: String,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            services_file: "services_updates.json".to_string(),
            users_file: "usuarios.json".to_string(),
            default_image: DEFAULT_IMAGE.to_string(),
            log_level: "info".to_string(),
        }
    }
}
