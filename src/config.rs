use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    pub oauth: OAuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Token validity window in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_token_ttl_hours() -> u64 {
    72
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            ttl_hours: default_token_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
        }
    }
}

/// One entry per supported provider. Providers without an entry are treated
/// as unsupported at runtime even though the enum knows about them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OAuthConfig {
    #[serde(default)]
    pub google: Option<OAuthProviderConfig>,
    #[serde(default)]
    pub discord: Option<OAuthProviderConfig>,
    #[serde(default)]
    pub github: Option<OAuthProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Overrides the provider's default scope set when non-empty.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Endpoint overrides, used by tests to point at a local double.
    #[serde(default)]
    pub authorization_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub user_info_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("AUTHLINK")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("AUTHLINK")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.jwt.ttl_hours, 72);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert!(config.oauth.google.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_load_from_yaml_file() {
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 4000
jwt:
  secret: "file-secret"
  ttl_hours: 24
database:
  url: "postgres://localhost/authlink"
oauth:
  google:
    client_id: "gid"
    client_secret: "gsecret"
    redirect_uri: "http://localhost:4000/auth/callback/google"
logging:
  level: "warn"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.jwt.secret, "file-secret");
        assert_eq!(config.jwt.ttl_hours, 24);
        assert_eq!(config.database.url, "postgres://localhost/authlink");
        let google = config.oauth.google.unwrap();
        assert_eq!(google.client_id, "gid");
        assert!(google.scopes.is_empty());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_load_nonexistent_file_falls_back_to_defaults() {
        let config = Config::load_from_file("nonexistent.yaml").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.jwt.ttl_hours, 72);
    }
}
