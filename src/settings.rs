use crate::models::AppSettings;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const SETTINGS_FILE: &str = "settings.json";

pub fn load_settings(data_dir: &Path) -> AppSettings {
    let path = data_dir.join(SETTINGS_FILE);
    match fs::read_to_string(&path) {
        Ok(raw) => serde_json::from_str::<AppSettings>(&raw).unwrap_or_else(|error| {
            tracing::warn!(
                path = %path.to_string_lossy(),
                error = %error,
                "malformed settings; using defaults"
            );
            AppSettings::default()
        }),
        Err(error) if error.kind() == ErrorKind::NotFound => AppSettings::default(),
        Err(error) => {
            tracing::warn!(
                path = %path.to_string_lossy(),
                error = %error,
                "unreadable settings; using defaults"
            );
            AppSettings::default()
        }
    }
}
