//! Companion configuration.
//!
//! Precedence: built-in defaults < TOML file < `COMPANION__*` environment variables.
//! The file is `$COMPANION_CONFIG` when set (must exist), else `config/companion.toml`
//! (optional). The Gemini key is read from `GEMINI_API_KEY` only, after the caller has
//! loaded `.env`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{AppEntry, Catalog, CatalogError};
use crate::gemini_bridge::{usable_api_key, DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_ICONS_DIR: &str = "/usr/share/icons/minecraftos/SVG";
pub const DEFAULT_CONFIG_PATH: &str = "config/companion";
pub const CONFIG_PATH_ENV: &str = "COMPANION_CONFIG";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const LOG_FILE_NAME: &str = ".minecraftos_companion.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Companion settings, built once at startup and shared read-only.
///
/// | Key | Default | Description |
/// |-----|---------|-------------|
/// | host | 127.0.0.1 | Bind address. |
/// | port | 8787 | Bind port. |
/// | icons_dir | /usr/share/icons/minecraftos/SVG | Icon directory. |
/// | public_url | http://localhost:{port} | Prefix of icon URLs in `/desktop-icons`. |
/// | log_file | ~/.minecraftos_companion.log | File log target. |
/// | gemini_model | gemini-1.5-flash | Chat model. |
/// | gemini_api_base | Generative Language v1beta | Chat API base URL. |
/// | chat_timeout_secs | 30 | Bound on one chat round trip. |
/// | expose_error_details | false | Append underlying error text to 500 bodies. |
/// | apps | built-in table | Desktop catalog override (`[[apps]]`). |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionConfig {
    pub host: String,
    pub port: u16,
    pub icons_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub chat_timeout_secs: u64,
    #[serde(default)]
    pub expose_error_details: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps: Option<Vec<AppEntry>>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            icons_dir: PathBuf::from(DEFAULT_ICONS_DIR),
            public_url: None,
            log_file: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            chat_timeout_secs: 30,
            expose_error_details: false,
            apps: None,
        }
    }
}

impl CompanionConfig {
    /// Load from `$COMPANION_CONFIG` (required) or `config/companion.toml` (optional), then env.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load_from(Some(Path::new(path.trim())), true),
            _ => Self::load_from(Some(Path::new(DEFAULT_CONFIG_PATH)), false),
        }
    }

    pub fn load_from(path: Option<&Path>, required: bool) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("host", defaults.host.as_str())?
            .set_default("port", i64::from(defaults.port))?
            .set_default("icons_dir", DEFAULT_ICONS_DIR)?
            .set_default("gemini_model", defaults.gemini_model.as_str())?
            .set_default("gemini_api_base", defaults.gemini_api_base.as_str())?
            .set_default("chat_timeout_secs", defaults.chat_timeout_secs as i64)?
            .set_default("expose_error_details", false)?;

        if let Some(path) = path {
            let name = path.to_string_lossy();
            builder = builder.add_source(config::File::with_name(&name).required(required));
        }

        let built = builder
            .add_source(
                config::Environment::with_prefix("COMPANION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use to fetch icons.
    pub fn public_url(&self) -> String {
        match self.public_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://localhost:{}", self.port),
        }
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs.max(1))
    }

    /// Desktop catalog from `[[apps]]`, or the built-in table.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.apps {
            Some(apps) => Catalog::new(apps.clone()),
            None => Ok(Catalog::builtin()),
        }
    }

    /// Log file path: `log_file` if set, else `~/.minecraftos_companion.log` under `home`.
    pub fn log_file_path(&self, home: Option<&Path>) -> PathBuf {
        match &self.log_file {
            Some(p) => p.clone(),
            None => home
                .map(|h| h.join(LOG_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME)),
        }
    }

    /// Gemini key from the environment; `None` when missing, blank or the placeholder.
    pub fn gemini_api_key() -> Option<String> {
        usable_api_key(std::env::var(GEMINI_API_KEY_ENV).ok().as_deref())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = CompanionConfig::load_from(Some(tmp.path().join("missing").as_path()), false).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.icons_dir, PathBuf::from(DEFAULT_ICONS_DIR));
        assert_eq!(cfg.public_url(), "http://localhost:8787");
        assert!(!cfg.expose_error_details);
        assert_eq!(cfg.catalog().unwrap().len(), 3);
    }

    #[test]
    fn required_file_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(CompanionConfig::load_from(Some(tmp.path().join("absent.toml").as_path()), true).is_err());
    }

    #[test]
    fn file_overrides_defaults_and_apps() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("companion.toml");
        fs::write(
            &path,
            r#"
port = 9000
icons_dir = "/tmp/icons"
public_url = "http://desk.local:9000/"
chat_timeout_secs = 5

[[apps]]
id = "terminal"
name = "Terminal"
icon = "terminal.svg"
command = "echo hi"
"#,
        )
        .unwrap();
        let cfg = CompanionConfig::load_from(Some(path.as_path()), true).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.public_url(), "http://desk.local:9000");
        assert_eq!(cfg.chat_timeout(), Duration::from_secs(5));
        let catalog = cfg.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("terminal").unwrap().launch_command, "echo hi");
    }

    #[test]
    fn saved_config_loads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out").join("companion.toml");
        let cfg = CompanionConfig {
            port: 9100,
            apps: Some(vec![AppEntry::new("files", "Files", "files.svg", "thunar")]),
            ..CompanionConfig::default()
        };
        cfg.save_to_path(&path).unwrap();
        let loaded = CompanionConfig::load_from(Some(path.as_path()), true).unwrap();
        assert_eq!(loaded.port, 9100);
        assert_eq!(loaded.apps, cfg.apps);
    }

    #[test]
    fn log_file_falls_back_to_home() {
        let cfg = CompanionConfig::default();
        assert_eq!(
            cfg.log_file_path(Some(Path::new("/home/steve"))),
            PathBuf::from("/home/steve/.minecraftos_companion.log")
        );
    }
}
