use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use coldchain_core::domain::{normalize_phone_target, Thresholds};
use coldchain_core::normalize::DEFAULT_REPORTING_OFFSET_SECS;
use coldchain_core::time::parse_offset;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const APP_DIR: &str = "coldchain";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_OWNER: &str = "default";
pub const DEFAULT_TRANSPORT_URL: &str = "http://127.0.0.1:5000/api/";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_POLL_ATTEMPTS: u32 = 8;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_POLL_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub owner: String,
    pub thresholds: ThresholdsConfig,
    pub notifications: NotificationsConfig,
    pub transport: TransportConfig,
    pub polling: PollingConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdsConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ThresholdsConfig {
    /// Both bounds, once configured. Bounds are validated on load.
    pub fn resolved(&self) -> Option<Thresholds> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Thresholds::new(min, max).ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationsConfig {
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ImportConfig {
    pub max_upload_bytes: u64,
    pub reporting_offset_secs: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            thresholds: ThresholdsConfig::default(),
            notifications: NotificationsConfig::default(),
            transport: TransportConfig {
                base_url: Url::parse(DEFAULT_TRANSPORT_URL).expect("default transport url"),
                timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
                user_agent: None,
            },
            polling: PollingConfig {
                max_attempts: DEFAULT_POLL_ATTEMPTS,
                interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            },
            import: ImportConfig {
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                reporting_offset_secs: DEFAULT_REPORTING_OFFSET_SECS,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("owner cannot be empty")]
    InvalidOwner,
    #[error("invalid thresholds: min {min} must be lower than max {max}")]
    InvalidThresholds { min: f64, max: f64 },
    #[error("invalid notifications.phone value: {0}")]
    InvalidPhone(String),
    #[error("invalid transport.base_url value: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid transport.timeout_seconds value: {0}")]
    InvalidTimeout(u64),
    #[error("invalid polling.max_attempts value: {0}")]
    InvalidPollAttempts(u32),
    #[error("invalid import.max_upload_bytes value: {0}")]
    InvalidUploadLimit(u64),
    #[error("invalid import.reporting_offset value: {0}")]
    InvalidOffset(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    owner: Option<String>,
    thresholds: Option<ThresholdsFile>,
    notifications: Option<NotificationsFile>,
    transport: Option<TransportFile>,
    polling: Option<PollingFile>,
    import: Option<ImportFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThresholdsFile {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NotificationsFile {
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransportFile {
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PollingFile {
    max_attempts: Option<u32>,
    interval_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportFile {
    max_upload_bytes: Option<u64>,
    reporting_offset: Option<String>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(owner) = parsed.owner {
        let trimmed = owner.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidOwner);
        }
        config.owner = trimmed.to_string();
    }

    if let Some(thresholds) = parsed.thresholds {
        if let (Some(min), Some(max)) = (thresholds.min, thresholds.max) {
            Thresholds::new(min, max).map_err(|_| ConfigError::InvalidThresholds { min, max })?;
        }
        config.thresholds = ThresholdsConfig {
            min: thresholds.min,
            max: thresholds.max,
        };
    }

    if let Some(notifications) = parsed.notifications {
        if let Some(phone) = notifications.phone {
            let normalized =
                normalize_phone_target(&phone).ok_or(ConfigError::InvalidPhone(phone))?;
            config.notifications.phone = Some(normalized);
        }
    }

    if let Some(transport) = parsed.transport {
        if let Some(raw) = transport.base_url {
            config.transport.base_url = parse_base_url(&raw)?;
        }
        if let Some(timeout) = transport.timeout_seconds {
            if timeout == 0 {
                return Err(ConfigError::InvalidTimeout(timeout));
            }
            config.transport.timeout_seconds = timeout;
        }
        config.transport.user_agent = transport
            .user_agent
            .map(|agent| agent.trim().to_string())
            .filter(|agent| !agent.is_empty());
    }

    if let Some(polling) = parsed.polling {
        if let Some(attempts) = polling.max_attempts {
            if attempts == 0 || attempts > MAX_POLL_ATTEMPTS {
                return Err(ConfigError::InvalidPollAttempts(attempts));
            }
            config.polling.max_attempts = attempts;
        }
        if let Some(interval) = polling.interval_seconds {
            config.polling.interval_seconds = interval;
        }
    }

    if let Some(import) = parsed.import {
        if let Some(limit) = import.max_upload_bytes {
            if limit == 0 {
                return Err(ConfigError::InvalidUploadLimit(limit));
            }
            config.import.max_upload_bytes = limit;
        }
        if let Some(raw) = import.reporting_offset {
            let offset = parse_offset(&raw).map_err(|_| ConfigError::InvalidOffset(raw))?;
            config.import.reporting_offset_secs = offset.local_minus_utc();
        }
    }

    Ok(config)
}

// Endpoint paths are joined onto the base, so it must end with a slash.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|_| ConfigError::InvalidBaseUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        load_at_path, merge_config, ConfigError, ConfigFile, ImportFile, NotificationsFile,
        PollingFile, ThresholdsFile, TransportFile, DEFAULT_POLL_ATTEMPTS,
    };
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).expect("metadata").permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).expect("chmod");
        }
    }

    #[test]
    fn defaults_leave_preconditions_unset() {
        let merged = merge_config(ConfigFile::default()).expect("merge");
        assert!(merged.thresholds.resolved().is_none());
        assert!(merged.notifications.phone.is_none());
        assert_eq!(merged.polling.max_attempts, DEFAULT_POLL_ATTEMPTS);
        assert_eq!(merged.import.reporting_offset_secs, 19_800);
    }

    #[test]
    fn merge_config_applies_values() {
        let parsed = ConfigFile {
            owner: Some(" ops ".to_string()),
            thresholds: Some(ThresholdsFile {
                min: Some(2.0),
                max: Some(8.0),
            }),
            notifications: Some(NotificationsFile {
                phone: Some("+1 (415) 555-1212".to_string()),
            }),
            transport: Some(TransportFile {
                base_url: Some("https://calls.example.com/api".to_string()),
                timeout_seconds: Some(10),
                user_agent: None,
            }),
            polling: Some(PollingFile {
                max_attempts: Some(3),
                interval_seconds: Some(1),
            }),
            import: Some(ImportFile {
                max_upload_bytes: Some(1024),
                reporting_offset: Some("+00:00".to_string()),
            }),
        };
        let merged = merge_config(parsed).expect("merge");
        assert_eq!(merged.owner, "ops");
        let thresholds = merged.thresholds.resolved().expect("thresholds");
        assert_eq!((thresholds.min, thresholds.max), (2.0, 8.0));
        assert_eq!(merged.notifications.phone.as_deref(), Some("+14155551212"));
        assert_eq!(
            merged.transport.base_url.as_str(),
            "https://calls.example.com/api/"
        );
        assert_eq!(merged.polling.max_attempts, 3);
        assert_eq!(merged.import.max_upload_bytes, 1024);
        assert_eq!(merged.import.reporting_offset_secs, 0);
    }

    #[test]
    fn merge_config_rejects_inverted_thresholds() {
        let parsed = ConfigFile {
            thresholds: Some(ThresholdsFile {
                min: Some(8.0),
                max: Some(2.0),
            }),
            ..ConfigFile::default()
        };
        let err = merge_config(parsed).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholds { .. }));
    }

    #[test]
    fn merge_config_rejects_bad_phone_and_url() {
        let phone = ConfigFile {
            notifications: Some(NotificationsFile {
                phone: Some("call me".to_string()),
            }),
            ..ConfigFile::default()
        };
        assert!(matches!(
            merge_config(phone).unwrap_err(),
            ConfigError::InvalidPhone(_)
        ));

        let url = ConfigFile {
            transport: Some(TransportFile {
                base_url: Some("ftp://example.com".to_string()),
                timeout_seconds: None,
                user_agent: None,
            }),
            ..ConfigFile::default()
        };
        assert!(matches!(
            merge_config(url).unwrap_err(),
            ConfigError::InvalidBaseUrl(_)
        ));
    }

    #[test]
    fn load_at_path_requires_file_when_requested() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("config.toml");
        let err = load_at_path(&missing, true).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("config file not found"));
    }

    #[test]
    fn load_at_path_parses_toml() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "owner = \"depot-7\"\n[thresholds]\nmin = 2.0\nmax = 8.0\n[notifications]\nphone = \"+917993557149\"\n",
        )
        .expect("write config");
        restrict_permissions(&path);

        let config = load_at_path(&path, true).expect("load").expect("config");
        assert_eq!(config.owner, "depot-7");
        assert!(config.thresholds.resolved().is_some());
        assert_eq!(config.notifications.phone.as_deref(), Some("+917993557149"));
    }

    #[test]
    fn load_at_path_rejects_unknown_keys() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "due_soon_days = 5\n").expect("write config");
        restrict_permissions(&path);

        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
