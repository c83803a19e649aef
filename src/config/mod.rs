use crate::error::{ProviderError, Result};
use crate::graph::{DEFAULT_API_VERSION, DEFAULT_MAX_RETRIES, GRAPH_BASE_URL};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding a bearer token; wins over the token cache
pub const ACCESS_TOKEN_ENV: &str = "MSGRAPH_ACCESS_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default)]
    pub default_tenant: Option<String>,

    #[serde(default)]
    pub log_level: String,
}

fn default_graph_base_url() -> String {
    GRAPH_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph_base_url: default_graph_base_url(),
            api_version: default_api_version(),
            max_retries: default_max_retries(),
            default_tenant: None,
            log_level: String::new(),
        }
    }
}

/// Token cache structure
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenCache {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub tenant_id: String,
}

/// Configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "msgraph-provider", "msgraph-provider").ok_or_else(|| {
            ProviderError::ConfigError("Failed to determine config directory".into())
        })?;

        Self::with_dir(project_dirs.config_dir())
    }

    /// Manager rooted at an explicit directory (created when missing)
    pub fn with_dir(config_dir: impl AsRef<Path>) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn token_cache_file(&self, tenant_name: &str) -> PathBuf {
        self.config_dir
            .join("cache")
            .join(format!("{}.token", tenant_name))
    }

    /// Load main config, defaults when the file does not exist
    pub fn load_config(&self) -> Result<Config> {
        let config_path = self.config_file();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        let contents = toml::to_string_pretty(config)
            .map_err(|e| ProviderError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(self.config_file(), contents)?;
        Ok(())
    }

    pub fn save_token(&self, tenant_name: &str, token: &TokenCache) -> Result<()> {
        let cache_dir = self.config_dir.join("cache");
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)?;
        }

        let contents = serde_json::to_string_pretty(token)?;
        fs::write(self.token_cache_file(tenant_name), contents)?;
        Ok(())
    }

    /// Load a cached token, rejecting expired ones
    pub fn load_token(&self, tenant_name: &str) -> Result<TokenCache> {
        let token_path = self.token_cache_file(tenant_name);

        if !token_path.exists() {
            return Err(ProviderError::TokenNotFound);
        }

        let contents = fs::read_to_string(token_path)?;
        let token: TokenCache = serde_json::from_str(&contents)?;

        if token.expires_at < chrono::Utc::now() {
            return Err(ProviderError::ConfigError(format!(
                "Cached token for tenant '{}' expired at {}",
                tenant_name, token.expires_at
            )));
        }

        Ok(token)
    }

    pub fn delete_token(&self, tenant_name: &str) -> Result<()> {
        let token_path = self.token_cache_file(tenant_name);

        if token_path.exists() {
            fs::remove_file(token_path)?;
        }

        Ok(())
    }

    /// Bearer token from `MSGRAPH_ACCESS_TOKEN`, else from the cache of `tenant`
    /// (or the configured default tenant)
    pub fn resolve_access_token(&self, tenant: Option<&str>) -> Result<String> {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }

        let config = self.load_config()?;
        let tenant = tenant
            .map(str::to_string)
            .or(config.default_tenant)
            .ok_or(ProviderError::TokenNotFound)?;

        Ok(self.load_token(&tenant)?.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();
        let config = manager.load_config().unwrap();
        assert_eq!(config.graph_base_url, "https://graph.microsoft.com");
        assert_eq!(config.api_version, "beta");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();
        fs::write(manager.config_file(), "default_tenant = \"contoso\"\nmax_retries = 5\n").unwrap();

        let config = manager.load_config().unwrap();
        assert_eq!(config.default_tenant.as_deref(), Some("contoso"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_version, "beta");
    }

    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();
        let config = Config {
            api_version: "v1.0".into(),
            ..Config::default()
        };
        manager.save_config(&config).unwrap();
        assert_eq!(manager.load_config().unwrap().api_version, "v1.0");
    }

    #[test]
    fn test_token_cache() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();

        assert!(matches!(manager.load_token("contoso"), Err(ProviderError::TokenNotFound)));

        let token = TokenCache {
            access_token: "abc".into(),
            refresh_token: None,
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
            tenant_id: "tid".into(),
        };
        manager.save_token("contoso", &token).unwrap();
        assert_eq!(manager.load_token("contoso").unwrap().access_token, "abc");

        let expired = TokenCache {
            expires_at: chrono::Utc::now() - chrono::Duration::hours(1),
            ..token
        };
        manager.save_token("fabrikam", &expired).unwrap();
        assert!(manager.load_token("fabrikam").is_err());

        manager.delete_token("contoso").unwrap();
        assert!(manager.load_token("contoso").is_err());
    }
}
