//! Configuration management for the OAuth 1.0 temporary credential server.
//!
//! Parses `oauth1.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `server.public_url`
//! - `clients[].secret`

mod expand;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override public URL used in signature base strings.
    pub public_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "oauth1.toml";

/// Signature method names accepted in `policy.signature_methods`.
pub const SIGNATURE_METHODS: [&str; 3] = ["PLAINTEXT", "HMAC-SHA1", "RSA-SHA1"];

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Validation and expiry policy.
    pub policy: PolicyConfig,
    /// Registered clients (key paths are relative strings from TOML).
    #[serde(rename = "clients")]
    clients_raw: Vec<ClientConfigRaw>,

    /// Resolved clients (set after loading).
    #[serde(skip)]
    pub clients: Vec<ClientConfig>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Externally visible base URL (scheme and authority), e.g. behind a
    /// reverse proxy. When unset, `http://<Host header>` is used.
    pub public_url: Option<String>,
    /// Path of the temporary credential endpoint.
    pub endpoint: String,
    /// Realm advertised in `WWW-Authenticate` challenges.
    pub realm: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7980,
            public_url: None,
            endpoint: "/oauth/initiate".to_owned(),
            realm: "oauth1".to_owned(),
        }
    }
}

/// Validation and expiry policy, all durations in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Accepted distance between `oauth_timestamp` and server time.
    pub timestamp_window: u64,
    /// How long nonce records are kept.
    pub nonce_retention: u64,
    /// Lifetime of issued temporary credentials.
    pub credential_ttl: u64,
    /// Interval between housekeeping runs.
    pub purge_interval: u64,
    /// Skip timestamp and nonce checks for `PLAINTEXT`.
    pub plaintext_skips_timestamp: bool,
    /// Enabled signature methods.
    pub signature_methods: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            timestamp_window: 300,
            nonce_retention: 600,
            credential_ttl: 900,
            purge_interval: 60,
            plaintext_skips_timestamp: true,
            signature_methods: SIGNATURE_METHODS.iter().map(|m| (*m).to_owned()).collect(),
        }
    }
}

/// Raw client entry as parsed from TOML (key path as string).
#[derive(Debug, Deserialize)]
struct ClientConfigRaw {
    id: String,
    secret: Option<String>,
    rsa_public_key: Option<String>,
    default_callback: Option<String>,
}

/// Resolved client entry with an absolute key path.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Client identifier (`oauth_consumer_key`).
    pub id: String,
    /// Shared secret for `PLAINTEXT` and `HMAC-SHA1`.
    pub secret: Option<String>,
    /// PEM file holding the client's RSA public key.
    pub rsa_public_key: Option<PathBuf>,
    /// Redirect target used when the client requests `oob`.
    pub default_callback: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("id", &self.id)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("rsa_public_key", &self.rsa_public_key)
            .field("default_callback", &self.default_callback)
            .finish()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`clients.app.secret`").
        field: String,
        /// Error message (e.g., "${`APP_SECRET`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a duration field to be greater than zero.
fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `oauth1.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(public_url) = &settings.public_url {
            self.server.public_url = Some(public_url.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_policy()?;
        self.validate_clients()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        if let Some(ref public_url) = self.server.public_url {
            require_non_empty(public_url, "server.public_url")?;
            require_http_url(public_url, "server.public_url")?;
        }

        if !self.server.endpoint.starts_with('/') {
            return Err(ConfigError::Validation(
                "server.endpoint must start with /".to_owned(),
            ));
        }

        require_non_empty(&self.server.realm, "server.realm")?;
        if self.server.realm.contains('"') {
            return Err(ConfigError::Validation(
                "server.realm cannot contain quotes".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate policy configuration.
    fn validate_policy(&self) -> Result<(), ConfigError> {
        let policy = &self.policy;
        require_positive(policy.timestamp_window, "policy.timestamp_window")?;
        require_positive(policy.credential_ttl, "policy.credential_ttl")?;
        require_positive(policy.purge_interval, "policy.purge_interval")?;

        // Nonces must outlive the window in which their timestamp is accepted
        if policy.nonce_retention < policy.timestamp_window {
            return Err(ConfigError::Validation(
                "policy.nonce_retention cannot be shorter than policy.timestamp_window".to_owned(),
            ));
        }

        if policy.signature_methods.is_empty() {
            return Err(ConfigError::Validation(
                "policy.signature_methods cannot be empty".to_owned(),
            ));
        }
        if let Some(unknown) = policy
            .signature_methods
            .iter()
            .find(|m| !SIGNATURE_METHODS.contains(&m.as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "policy.signature_methods: unknown method \"{unknown}\""
            )));
        }

        Ok(())
    }

    /// Validate client entries.
    fn validate_clients(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for client in &self.clients {
            require_non_empty(&client.id, "clients.id")?;
            if !seen.insert(client.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate client id \"{}\"",
                    client.id
                )));
            }
            if let Some(ref secret) = client.secret {
                require_non_empty(secret, &format!("clients.{}.secret", client.id))?;
            }
            if client.secret.is_none() && client.rsa_public_key.is_none() {
                return Err(ConfigError::Validation(format!(
                    "client \"{}\" needs a secret or an rsa_public_key",
                    client.id
                )));
            }
            if let Some(ref callback) = client.default_callback {
                require_http_url(callback, &format!("clients.{}.default_callback", client.id))?;
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        expand::expand_optional(&mut self.server.public_url, "server.public_url")?;

        for client in &mut self.clients_raw {
            let field = format!("clients.{}.secret", client.id);
            expand::expand_optional(&mut client.secret, &field)?;
        }

        Ok(())
    }

    /// Resolve client key paths relative to the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.clients = self
            .clients_raw
            .iter()
            .map(|raw| ClientConfig {
                id: raw.id.clone(),
                secret: raw.secret.clone(),
                rsa_public_key: raw.rsa_public_key.as_deref().map(|p| config_dir.join(p)),
                default_callback: raw.default_callback.clone(),
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(toml: &str) -> Config {
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/etc/oauth1"));
        config
    }

    fn validation_message(config: &Config) -> String {
        match config.validate() {
            Err(ConfigError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7980);
        assert_eq!(config.server.endpoint, "/oauth/initiate");
        assert_eq!(config.server.realm, "oauth1");
        assert!(config.server.public_url.is_none());
        assert_eq!(config.policy.timestamp_window, 300);
        assert_eq!(config.policy.nonce_retention, 600);
        assert_eq!(config.policy.credential_ttl, 900);
        assert!(config.policy.plaintext_skips_timestamp);
        assert_eq!(config.policy.signature_methods, SIGNATURE_METHODS);
        assert!(config.clients.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse("");
        assert_eq!(config.server.port, 7980);
        assert!(config.clients.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
[server]
host = "0.0.0.0"
port = 9000
public_url = "https://auth.example.com"
endpoint = "/initiate"
realm = "Photos"

[policy]
timestamp_window = 120
nonce_retention = 240
credential_ttl = 60
plaintext_skips_timestamp = false
signature_methods = ["HMAC-SHA1"]

[[clients]]
id = "printer"
secret = "kd94hf93k423kf44"
default_callback = "https://printer.example.com/ready"

[[clients]]
id = "rsa-client"
rsa_public_key = "keys/client.pem"
"#,
        );

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.public_url.as_deref(), Some("https://auth.example.com"));
        assert_eq!(config.server.endpoint, "/initiate");
        assert_eq!(config.policy.timestamp_window, 120);
        assert!(!config.policy.plaintext_skips_timestamp);
        assert_eq!(config.policy.signature_methods, vec!["HMAC-SHA1".to_owned()]);
        assert_eq!(
            config.clients,
            vec![
                ClientConfig {
                    id: "printer".to_owned(),
                    secret: Some("kd94hf93k423kf44".to_owned()),
                    rsa_public_key: None,
                    default_callback: Some("https://printer.example.com/ready".to_owned()),
                },
                ClientConfig {
                    id: "rsa-client".to_owned(),
                    secret: None,
                    rsa_public_key: Some(PathBuf::from("/etc/oauth1/keys/client.pem")),
                    default_callback: None,
                },
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_debug_redacts_secret() {
        let config = parse(
            r#"
[[clients]]
id = "app"
secret = "hunter2"
"#,
        );
        let debug = format!("{:?}", config.clients);
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(8080),
            public_url: Some("https://auth.example.com".to_owned()),
        });

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_url.as_deref(), Some("https://auth.example.com"));
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7980);
        assert!(config.server.public_url.is_none());
    }

    #[test]
    fn test_validate_server_port_zero() {
        let config = parse("[server]\nport = 0");
        assert_eq!(validation_message(&config), "server.port cannot be 0");
    }

    #[test]
    fn test_validate_public_url_scheme() {
        let config = parse("[server]\npublic_url = \"auth.example.com\"");
        assert!(validation_message(&config).contains("server.public_url"));
    }

    #[test]
    fn test_validate_endpoint_path() {
        let config = parse("[server]\nendpoint = \"initiate\"");
        assert!(validation_message(&config).contains("server.endpoint"));
    }

    #[test]
    fn test_validate_nonce_retention_covers_window() {
        let config = parse("[policy]\ntimestamp_window = 600\nnonce_retention = 300");
        assert!(validation_message(&config).contains("nonce_retention"));
    }

    #[test]
    fn test_validate_unknown_signature_method() {
        let config = parse("[policy]\nsignature_methods = [\"HMAC-SHA256\"]");
        assert!(validation_message(&config).contains("HMAC-SHA256"));
    }

    #[test]
    fn test_validate_empty_signature_methods() {
        let config = parse("[policy]\nsignature_methods = []");
        assert!(validation_message(&config).contains("signature_methods"));
    }

    #[test]
    fn test_validate_duplicate_client() {
        let config = parse(
            r#"
[[clients]]
id = "app"
secret = "a"

[[clients]]
id = "app"
secret = "b"
"#,
        );
        assert_eq!(validation_message(&config), "duplicate client id \"app\"");
    }

    #[test]
    fn test_validate_client_without_key_material() {
        let config = parse("[[clients]]\nid = \"app\"");
        assert!(validation_message(&config).contains("needs a secret"));
    }

    #[test]
    fn test_validate_client_default_callback() {
        let config = parse(
            r#"
[[clients]]
id = "app"
secret = "s"
default_callback = "oob"
"#,
        );
        assert!(validation_message(&config).contains("clients.app.default_callback"));
    }

    #[test]
    fn test_expand_env_vars_client_secret() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("OAUTH1_TEST_CLIENT_SECRET", "from-env");
        }
        let mut config: Config = toml::from_str(
            r#"
[[clients]]
id = "app"
secret = "${OAUTH1_TEST_CLIENT_SECRET}"
"#,
        )
        .unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("."));

        assert_eq!(config.clients[0].secret.as_deref(), Some("from-env"));
        unsafe {
            std::env::remove_var("OAUTH1_TEST_CLIENT_SECRET");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("OAUTH1_TEST_MISSING_HOST");
        }
        let mut config: Config =
            toml::from_str("[server]\nhost = \"${OAUTH1_TEST_MISSING_HOST}\"").unwrap();

        let err = config.expand_env_vars().unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "server.host"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[server]
port = 8081

[[clients]]
id = "app"
rsa_public_key = "app.pem"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(
            config.clients[0].rsa_public_key,
            Some(dir.path().join("app.pem"))
        );
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/oauth1.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[policy]\npurge_interval = 0\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("policy.purge_interval"));
    }
}
