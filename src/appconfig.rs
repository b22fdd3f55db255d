use std::path::Path;

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    sample::ActiveSample,
    session::{ClickSession, DEFAULT_FIELD_NAME, DEFAULT_LABEL_NAME, DEFAULT_MODEL_NAME},
};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub server_url: String,
    pub dataset_name: String,
    pub plugin_uri: String,
    pub request_timeout_secs: u64,

    pub default_field_name: String,
    pub default_label_name: String,
    pub default_model_name: String,

    /// Sample opened at startup, if any
    pub sample_id: String,
    pub sample_filepath: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            server_url: "http://localhost:5151".to_string(),
            dataset_name: "".to_string(),
            plugin_uri: "@51labs/click-segmentation".to_string(),
            request_timeout_secs: 300,
            default_field_name: DEFAULT_FIELD_NAME.to_string(),
            default_label_name: DEFAULT_LABEL_NAME.to_string(),
            default_model_name: DEFAULT_MODEL_NAME.to_string(),
            sample_id: "".to_string(),
            sample_filepath: "".to_string(),
        }
    }
}

impl AppSettings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        let settings = toml::from_str(&s).context("Failed to parse AppSettings from TOML")?;
        Ok(settings)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = toml::to_string_pretty(self).context("Failed to serialize AppSettings to TOML")?;
        std::fs::write(path, s)?;
        Ok(())
    }

    pub fn startup_sample(&self) -> Option<ActiveSample> {
        if self.sample_id.trim().is_empty() {
            return None;
        }
        Some(ActiveSample::new(
            self.sample_id.trim(),
            self.sample_filepath.trim(),
        ))
    }

    pub fn new_session(&self) -> ClickSession {
        ClickSession::with_defaults(
            self.default_field_name.clone(),
            self.default_label_name.clone(),
            self.default_model_name.clone(),
        )
    }
}

/// Resolves `path` below the server URL, keeping any path prefix the URL has
/// with or without a trailing slash.
pub fn server_endpoint(server_url: &str, path: &str) -> Result<Url> {
    let mut base =
        Url::parse(server_url).with_context(|| format!("Invalid server URL: {:?}", server_url))?;
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    base.join(path)
        .with_context(|| format!("Failed to build {} URL", path))
}

pub fn read_settings_or_default<P: AsRef<Path>>(path: P) -> AppSettings {
    match AppSettings::load_from_file(&path) {
        Ok(settings) => {
            debug!("Loaded settings from {}", path.as_ref().display());
            settings
        }
        Err(e) => {
            warn!("Using default settings: {:#}", e);
            AppSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings: AppSettings = toml::from_str(
            r#"
            server_url = "http://10.0.0.2:5151"
            sample_id = "66a1"
            sample_filepath = "/data/a.jpg"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server_url, "http://10.0.0.2:5151");
        assert_eq!(settings.plugin_uri, "@51labs/click-segmentation");
        assert_eq!(settings.request_timeout_secs, 300);
        assert_eq!(
            settings.startup_sample(),
            Some(ActiveSample::new("66a1", "/data/a.jpg"))
        );

        let session = settings.new_session();
        assert_eq!(session.field_name(), "user_clicks");
        assert_eq!(session.model_name(), DEFAULT_MODEL_NAME);
    }

    #[test]
    fn blank_sample_id_means_no_startup_sample() {
        let settings = AppSettings {
            sample_id: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.startup_sample(), None);
    }

    #[test]
    fn settings_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let settings = AppSettings {
            dataset_name: "quickstart".to_string(),
            default_label_name: "person".to_string(),
            ..Default::default()
        };
        settings.save_to_file(&path).unwrap();

        assert_eq!(AppSettings::load_from_file(&path).unwrap(), settings);
    }

    #[test]
    fn endpoints_keep_the_server_path_prefix() {
        for server in ["http://host/fiftyone", "http://host/fiftyone/"] {
            let url = server_endpoint(server, "operators/execute").unwrap();
            assert_eq!(url.as_str(), "http://host/fiftyone/operators/execute");
        }

        let url = server_endpoint("http://localhost:5151", "media").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5151/media");
    }

    #[test]
    fn unreadable_config_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        assert_eq!(read_settings_or_default(&path), AppSettings::default());

        std::fs::write(&path, "server_url = [").unwrap();
        assert_eq!(read_settings_or_default(&path), AppSettings::default());
    }
}
