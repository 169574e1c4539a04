pub mod app;
pub mod catalog;
pub mod errors;
pub mod ids;
pub mod models;
pub mod normalize;
pub mod notifications;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod store;
pub mod timestamps;
pub mod updates;
pub mod users;
pub mod validation;

pub use crate::app::AppCore;
pub use crate::errors::{AppError, AppResult};
pub use crate::models::{
    AppSettings, CreateServiceRequest, EditUserRequest, ListServicesRequest, MigrationReport,
    NotificationItem, RegisterUserRequest, ServiceFilter, ServiceMap, ServiceRecord, ServiceSort,
    ServiceStatus, UpdateEntry, UserAccount,
};
pub use crate::session::Session;

use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// JSON lines into `<data_dir>/logs/arruma.log.<date>`. `RUST_LOG` wins over
/// the level from settings.
pub fn init_tracing(data_dir: &Path, default_level: &str) -> AppResult<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "arruma.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}
