//! Configuration loading.
//!
//! The configuration lives in a YAML file:
//!
//! ```yaml
//! koku:
//!   hostname: koku.example.com
//!   port: 8000
//!   https: false
//!   ssl-verify: false
//!   username: admin
//!   password: pass
//! providers:
//!   - type: AWS
//!     authentication:
//!       provider_resource_name: arn:aws:iam::111111111111:role/CostManagement
//!     billing_source:
//!       bucket: cost-usage-bucket
//! reports:
//!   username: test_customer
//!   password: str0ng!P@ss
//!   deviation: 1
//! ```
//!
//! Selected `koku` keys can be overridden from the environment (see
//! [`HanseiConfig::apply_env`]).

use std::path::{Path, PathBuf};

use hansei_core::Deviation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Path of the Koku API relative to the server root.
pub const API_ROOT: &str = "api/v1/";

/// Service admin username used when the config names none.
pub const DEFAULT_USERNAME: &str = "admin";

/// Service admin password used when the config names none.
pub const DEFAULT_PASSWORD: &str = "pass";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "HANSEI_CONFIG";

/// Errors raised while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file exists at any of the searched locations.
    #[error("unable to find a configuration file; searched: {}", display_paths(.searched))]
    NotFound {
        /// Every path that was tried, in order.
        searched: Vec<PathBuf>,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid YAML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// `koku.hostname` is required to build the server URL.
    #[error("'koku' section has no 'hostname' key")]
    MissingHostname,

    /// `KOKU_PORT` is not a valid port number.
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// `reports.deviation` is negative.
    #[error("report deviation must not be negative: {0}")]
    InvalidDeviation(Decimal),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HanseiConfig {
    /// Koku server location and service admin credentials.
    #[serde(default)]
    pub koku: KokuConfig,

    /// Cost providers available to fixtures.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Settings for report validation.
    #[serde(default)]
    pub reports: ReportsConfig,
}

/// The `koku` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KokuConfig {
    /// Server hostname or IP address.
    #[serde(default)]
    pub hostname: Option<String>,

    /// Server port. Omitted from the URL when unset.
    #[serde(default)]
    pub port: Option<u16>,

    /// Use `https` instead of `http`.
    #[serde(default)]
    pub https: bool,

    /// Verify the server's TLS certificate.
    #[serde(default, rename = "ssl-verify")]
    pub ssl_verify: bool,

    /// Service admin username.
    #[serde(default = "default_username")]
    pub username: String,

    /// Service admin password.
    #[serde(default = "default_password")]
    pub password: String,
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

impl Default for KokuConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            port: None,
            https: false,
            ssl_verify: false,
            username: default_username(),
            password: default_password(),
        }
    }
}

impl KokuConfig {
    /// Set the hostname.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Set the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Switch to `https`.
    #[must_use]
    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Set the service admin credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// The API root, e.g. `http://koku.example.com:8000/api/v1/`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingHostname`] if no hostname is set.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let hostname = self
            .hostname
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::MissingHostname)?;

        let scheme = if self.https { "https" } else { "http" };
        let netloc = match self.port {
            Some(port) => format!("{hostname}:{port}"),
            None => hostname.to_string(),
        };

        Ok(format!("{scheme}://{netloc}/{API_ROOT}"))
    }
}

/// One entry of the `providers` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type, e.g. `AWS`.
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Credentials the server uses to reach the provider.
    #[serde(default)]
    pub authentication: Value,

    /// Where the provider's billing data is stored.
    #[serde(default)]
    pub billing_source: Value,
}

/// The `reports` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// User whose reports are validated. Defaults to the service admin.
    #[serde(default)]
    pub username: Option<String>,

    /// Password for [`username`](Self::username).
    #[serde(default)]
    pub password: Option<String>,

    /// Allowed difference between server totals and summed line items.
    #[serde(default)]
    pub deviation: Option<Decimal>,
}

impl ReportsConfig {
    /// Tolerance for cost and storage totals, [`Deviation::DEFAULT`] if unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDeviation`] for negative values.
    pub fn deviation(&self) -> Result<Deviation, ConfigError> {
        match self.deviation {
            Some(amount) => Deviation::new(amount).map_err(|_| ConfigError::InvalidDeviation(amount)),
            None => Ok(Deviation::DEFAULT),
        }
    }
}

impl HanseiConfig {
    /// Locate, parse and apply environment overrides using the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no file is found or the file is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load) with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if no file is found or the file is invalid.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let searched = candidate_paths(&env);
        let path = searched
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                searched: searched.clone(),
            })?;

        info!(path = %path.display(), "Loading hansei configuration");
        let mut config = Self::from_path(&path)?;
        config.apply_env(env)?;
        Ok(config)
    }

    /// Parse a configuration file without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text. An empty document yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid YAML.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Override `koku` settings from `KOKU_HOSTNAME`, `KOKU_PORT`,
    /// `KOKU_SERVICE_ADMIN_USER` and `KOKU_SERVICE_ADMIN_PASSWORD`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] if `KOKU_PORT` is not a port.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(hostname) = env("KOKU_HOSTNAME").filter(|v| !v.is_empty()) {
            debug!(hostname = %hostname, "Overriding koku hostname from environment");
            self.koku.hostname = Some(hostname);
        }
        if let Some(port) = env("KOKU_PORT").filter(|v| !v.is_empty()) {
            let parsed = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
            self.koku.port = Some(parsed);
        }
        if let Some(username) = env("KOKU_SERVICE_ADMIN_USER").filter(|v| !v.is_empty()) {
            self.koku.username = username;
        }
        if let Some(password) = env("KOKU_SERVICE_ADMIN_PASSWORD").filter(|v| !v.is_empty()) {
            self.koku.password = password;
        }
        Ok(())
    }

    /// First configured provider of the given type.
    #[must_use]
    pub fn provider(&self, provider_type: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|p| p.provider_type.eq_ignore_ascii_case(provider_type))
    }

    /// Credentials for report validation, falling back to the service admin.
    #[must_use]
    pub fn report_credentials(&self) -> (&str, &str) {
        (
            self.reports
                .username
                .as_deref()
                .unwrap_or(&self.koku.username),
            self.reports
                .password
                .as_deref()
                .unwrap_or(&self.koku.password),
        )
    }
}

/// Locations searched for `config.yaml`, most specific first.
#[must_use]
pub fn candidate_paths(env: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(explicit) = env(CONFIG_PATH_ENV).filter(|v| !v.is_empty()) {
        paths.push(PathBuf::from(explicit));
    }

    paths.push(PathBuf::from("config.yaml"));

    let config_home = env("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| env("HOME").map(|home| Path::new(&home).join(".config")));
    if let Some(home) = config_home {
        paths.push(home.join("hansei").join("config.yaml"));
    }

    let config_dirs = env("XDG_CONFIG_DIRS")
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/etc/xdg".to_string());
    paths.extend(
        config_dirs
            .split(':')
            .filter(|dir| !dir.is_empty())
            .map(|dir| Path::new(dir).join("hansei").join("config.yaml")),
    );

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
koku:
  hostname: koku.example.com
  port: 8000
  https: true
  ssl-verify: true
  username: root
  password: secret
providers:
  - type: OCP
    authentication: {provider_resource_name: cluster-1}
  - type: AWS
    authentication:
      provider_resource_name: "arn:aws:iam::111111111111:role/CostManagement"
    billing_source:
      bucket: cost-usage-bucket
reports:
  username: test_customer
  password: "str0ng!P@ss"
  deviation: 0.5
"#;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_full_config() {
        let config = HanseiConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(config.koku.hostname.as_deref(), Some("koku.example.com"));
        assert_eq!(config.koku.port, Some(8000));
        assert!(config.koku.https);
        assert!(config.koku.ssl_verify);
        assert_eq!(config.providers.len(), 2);

        let aws = config.provider("aws").unwrap();
        assert_eq!(aws.billing_source["bucket"], "cost-usage-bucket");
        assert_eq!(config.report_credentials(), ("test_customer", "str0ng!P@ss"));
        assert_eq!(
            config.reports.deviation().unwrap(),
            Deviation::new(dec!(0.5)).unwrap()
        );
    }

    #[test]
    fn defaults_apply_to_sparse_config() {
        let config = HanseiConfig::from_yaml_str("koku:\n  hostname: localhost\n").unwrap();

        assert_eq!(config.koku.username, DEFAULT_USERNAME);
        assert_eq!(config.koku.password, DEFAULT_PASSWORD);
        assert!(!config.koku.https);
        assert!(!config.koku.ssl_verify);
        assert!(config.providers.is_empty());
        assert_eq!(config.report_credentials(), (DEFAULT_USERNAME, DEFAULT_PASSWORD));
        assert_eq!(config.reports.deviation().unwrap(), Deviation::DEFAULT);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(HanseiConfig::from_yaml_str("  \n").unwrap(), HanseiConfig::default());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(matches!(
            HanseiConfig::from_yaml_str("koku: [unterminated"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn negative_deviation_is_rejected() {
        let config = HanseiConfig::from_yaml_str("reports:\n  deviation: -2\n").unwrap();
        assert!(matches!(
            config.reports.deviation(),
            Err(ConfigError::InvalidDeviation(_))
        ));
    }

    #[test]
    fn base_url_variants() {
        let plain = KokuConfig::default().with_hostname("localhost");
        assert_eq!(plain.base_url().unwrap(), "http://localhost/api/v1/");

        let full = KokuConfig::default()
            .with_hostname("koku.example.com")
            .with_port(8443)
            .with_https(true);
        assert_eq!(full.base_url().unwrap(), "https://koku.example.com:8443/api/v1/");

        assert!(matches!(
            KokuConfig::default().base_url(),
            Err(ConfigError::MissingHostname)
        ));
    }

    #[test]
    fn environment_overrides() {
        let mut config = HanseiConfig::from_yaml_str(SAMPLE).unwrap();
        config
            .apply_env(env_from(&[
                ("KOKU_HOSTNAME", "override.example.com"),
                ("KOKU_PORT", "9000"),
                ("KOKU_SERVICE_ADMIN_USER", "ops"),
                ("KOKU_SERVICE_ADMIN_PASSWORD", "hunter2"),
            ]))
            .unwrap();

        assert_eq!(config.koku.hostname.as_deref(), Some("override.example.com"));
        assert_eq!(config.koku.port, Some(9000));
        assert_eq!(config.koku.username, "ops");
        assert_eq!(config.koku.password, "hunter2");
    }

    #[test]
    fn invalid_port_override() {
        let mut config = HanseiConfig::default();
        let result = config.apply_env(env_from(&[("KOKU_PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::InvalidPort(p)) if p == "eighty"));
    }

    #[test]
    fn candidate_paths_follow_xdg() {
        let paths = candidate_paths(env_from(&[
            ("HANSEI_CONFIG", "/tmp/explicit.yaml"),
            ("HOME", "/home/qe"),
            ("XDG_CONFIG_DIRS", "/etc/one:/etc/two"),
        ]));

        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/explicit.yaml"),
                PathBuf::from("config.yaml"),
                PathBuf::from("/home/qe/.config/hansei/config.yaml"),
                PathBuf::from("/etc/one/hansei/config.yaml"),
                PathBuf::from("/etc/two/hansei/config.yaml"),
            ]
        );
    }

    #[test]
    fn load_reads_explicit_file_and_applies_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hansei.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let path_str = path.to_string_lossy().to_string();

        let config = HanseiConfig::load_with(env_from(&[
            ("HANSEI_CONFIG", path_str.as_str()),
            ("KOKU_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.koku.port, Some(8080));
        assert_eq!(config.koku.username, "root");
    }

    #[test]
    fn load_reports_searched_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let missing_str = missing.to_string_lossy().to_string();

        let err = HanseiConfig::load_with(env_from(&[
            ("HANSEI_CONFIG", missing_str.as_str()),
            ("XDG_CONFIG_HOME", missing_str.as_str()),
            ("XDG_CONFIG_DIRS", missing_str.as_str()),
        ]))
        .unwrap_err();

        match err {
            ConfigError::NotFound { searched } => assert!(searched.contains(&missing)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
