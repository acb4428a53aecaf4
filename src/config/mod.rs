//! Configuration management for the sync tool

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity provider type (only "keycloak" is supported)
    pub provider: String,
    /// Keycloak configuration, present when the provider is Keycloak
    pub keycloak: Option<KeycloakConfig>,
    /// Sync run configuration
    pub sync: SyncConfig,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Base URL of the Keycloak server (e.g., https://keycloak.example.com)
    pub url: String,
    /// Realm whose users and groups are synced
    pub realm: String,
    /// Realm used to obtain the admin token (usually "master")
    pub auth_realm: String,
    pub client_id: String,
    pub client_secret: String,
    /// Admin credentials for the password grant; when absent the
    /// client-credentials grant is used
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Page size for paginated admin API listings
    pub page_size: u32,
}

impl KeycloakConfig {
    /// Whether the password grant should be used for the admin token
    pub fn uses_password_grant(&self) -> bool {
        self.admin_username.is_some() && self.admin_password.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Path to the group mapping document
    pub mapping_file: Option<PathBuf>,
    /// Destination of the rendered groups document
    pub groups_output: PathBuf,
    /// Destination of the rendered users document
    pub users_output: PathBuf,
    /// Comma-separated glob patterns of usernames to leave out
    pub exclude_users: String,
    /// Print the documents instead of writing them
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mapping_file: None,
            groups_output: PathBuf::from("groups.yaml"),
            users_output: PathBuf::from("users.yaml"),
            exclude_users: String::new(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log output format: "text" or "json"
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, with `overrides`
    /// (e.g. command-line flags) taking precedence
    pub fn from_env_with_overrides(overrides: &HashMap<String, String>) -> Result<Self> {
        Self::from_vars(|key| overrides.get(key).cloned().or_else(|| env::var(key).ok()))
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = var("IDP_PROVIDER")
            .map(|p| p.trim().to_lowercase())
            .unwrap_or_else(|| "keycloak".to_string());

        let keycloak = if provider == "keycloak" {
            Some(KeycloakConfig {
                url: var("KEYCLOAK_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .context("KEYCLOAK_URL is required")?,
                realm: var("KEYCLOAK_REALM").context("KEYCLOAK_REALM is required")?,
                auth_realm: var("KEYCLOAK_AUTH_REALM").unwrap_or_else(|| "master".to_string()),
                client_id: var("KEYCLOAK_CLIENT_ID").unwrap_or_else(|| "admin-cli".to_string()),
                client_secret: var("KEYCLOAK_CLIENT_SECRET").unwrap_or_default(),
                admin_username: var("KEYCLOAK_ADMIN").filter(|v| !v.is_empty()),
                admin_password: var("KEYCLOAK_ADMIN_PASSWORD").filter(|v| !v.is_empty()),
                page_size: var("KEYCLOAK_PAGE_SIZE")
                    .unwrap_or_else(|| "100".to_string())
                    .parse()
                    .context("Invalid KEYCLOAK_PAGE_SIZE")?,
            })
        } else {
            None
        };

        let defaults = SyncConfig::default();
        let sync = SyncConfig {
            mapping_file: var("MAPPING_FILE").map(PathBuf::from),
            groups_output: var("GROUPS_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.groups_output),
            users_output: var("USERS_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.users_output),
            exclude_users: var("EXCLUDE_USERS").unwrap_or_default(),
            dry_run: var("DRY_RUN")
                .map(|s| parse_bool("DRY_RUN", &s))
                .transpose()?
                .unwrap_or(false),
        };

        Ok(Self {
            provider,
            keycloak,
            sync,
            telemetry: TelemetryConfig {
                log_format: var("LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
            },
        })
    }

    /// Check the settings that can only be judged once CLI overrides are applied
    pub fn validate(&self) -> Result<()> {
        if self.sync.mapping_file.is_none() {
            bail!("MAPPING_FILE is required");
        }

        if let Some(keycloak) = &self.keycloak {
            if keycloak.page_size == 0 {
                bail!("KEYCLOAK_PAGE_SIZE must be greater than zero");
            }
            if !keycloak.uses_password_grant() && keycloak.client_secret.is_empty() {
                bail!(
                    "Keycloak credentials are required: set KEYCLOAK_ADMIN and \
                     KEYCLOAK_ADMIN_PASSWORD, or KEYCLOAK_CLIENT_SECRET"
                );
            }
        }

        Ok(())
    }
}

/// Accept the usual spellings of a boolean flag; anything else is rejected
/// rather than silently read as false.
fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => bail!("Invalid {}: '{}' (expected true or false)", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let map = vars(pairs);
        Config::from_vars(|key| map.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("KEYCLOAK_URL", "http://localhost:8081/"),
            ("KEYCLOAK_REALM", "corp"),
            ("KEYCLOAK_CLIENT_SECRET", "secret"),
            ("MAPPING_FILE", "mapping.yaml"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = load(&minimal()).unwrap();

        assert_eq!(config.provider, "keycloak");
        let kc = config.keycloak.as_ref().unwrap();
        assert_eq!(kc.url, "http://localhost:8081");
        assert_eq!(kc.realm, "corp");
        assert_eq!(kc.auth_realm, "master");
        assert_eq!(kc.client_id, "admin-cli");
        assert_eq!(kc.page_size, 100);
        assert!(!kc.uses_password_grant());
        assert_eq!(config.sync.groups_output, PathBuf::from("groups.yaml"));
        assert_eq!(config.sync.users_output, PathBuf::from("users.yaml"));
        assert!(!config.sync.dry_run);
        assert_eq!(config.telemetry.log_format, "text");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_keycloak_url() {
        let err = load(&[("KEYCLOAK_REALM", "corp")]).unwrap_err();
        assert!(err.to_string().contains("KEYCLOAK_URL is required"));
    }

    #[test]
    fn test_missing_realm() {
        let err = load(&[("KEYCLOAK_URL", "http://kc")]).unwrap_err();
        assert!(err.to_string().contains("KEYCLOAK_REALM is required"));
    }

    #[test]
    fn test_invalid_page_size() {
        let mut pairs = minimal();
        pairs.push(("KEYCLOAK_PAGE_SIZE", "many"));
        let err = load(&pairs).unwrap_err();
        assert!(err.to_string().contains("Invalid KEYCLOAK_PAGE_SIZE"));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut pairs = minimal();
        pairs.push(("KEYCLOAK_PAGE_SIZE", "0"));
        let config = load(&pairs).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_mapping_file() {
        let pairs: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| *k != "MAPPING_FILE")
            .collect();
        let config = load(&pairs).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MAPPING_FILE is required"));
    }

    #[test]
    fn test_missing_credentials() {
        let pairs: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| *k != "KEYCLOAK_CLIENT_SECRET")
            .collect();
        let config = load(&pairs).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Keycloak credentials are required"));
    }

    #[test]
    fn test_password_grant_credentials() {
        let config = load(&[
            ("KEYCLOAK_URL", "http://kc"),
            ("KEYCLOAK_REALM", "corp"),
            ("KEYCLOAK_ADMIN", "admin"),
            ("KEYCLOAK_ADMIN_PASSWORD", "pw"),
            ("MAPPING_FILE", "m.yaml"),
        ])
        .unwrap();

        assert!(config.keycloak.as_ref().unwrap().uses_password_grant());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_keycloak_provider_skips_keycloak_section() {
        let config = load(&[("IDP_PROVIDER", "Okta"), ("MAPPING_FILE", "m.yaml")]).unwrap();

        assert_eq!(config.provider, "okta");
        assert!(config.keycloak.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sync_overrides() {
        let mut pairs = minimal();
        pairs.extend([
            ("GROUPS_OUTPUT", "out/groups.yaml"),
            ("USERS_OUTPUT", "out/users.yaml"),
            ("EXCLUDE_USERS", "svc-*, test?"),
            ("DRY_RUN", "TRUE"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = load(&pairs).unwrap();

        assert_eq!(config.sync.groups_output, PathBuf::from("out/groups.yaml"));
        assert_eq!(config.sync.users_output, PathBuf::from("out/users.yaml"));
        assert_eq!(config.sync.exclude_users, "svc-*, test?");
        assert!(config.sync.dry_run);
        assert_eq!(config.telemetry.log_format, "json");
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("1", true)]
    #[case("yes", true)]
    #[case("on", true)]
    #[case("false", false)]
    #[case("0", false)]
    #[case("No", false)]
    #[case("", false)]
    fn test_dry_run_values(#[case] value: &str, #[case] expected: bool) {
        let mut pairs = minimal();
        pairs.push(("DRY_RUN", value));
        assert_eq!(load(&pairs).unwrap().sync.dry_run, expected);
    }

    #[test]
    fn test_invalid_dry_run_rejected() {
        let mut pairs = minimal();
        pairs.push(("DRY_RUN", "maybe"));
        let err = load(&pairs).unwrap_err();
        assert!(err.to_string().contains("Invalid DRY_RUN"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut overrides = vars(&minimal());
        overrides.insert("KEYCLOAK_REALM".to_string(), "from-cli".to_string());
        overrides.insert("DRY_RUN".to_string(), "true".to_string());

        let config = Config::from_env_with_overrides(&overrides).unwrap();

        assert_eq!(config.keycloak.as_ref().unwrap().realm, "from-cli");
        assert!(config.sync.dry_run);
        assert_eq!(config.sync.mapping_file, Some(PathBuf::from("mapping.yaml")));
    }

    #[test]
    fn test_config_debug() {
        let config = load(&minimal()).unwrap();
        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("KeycloakConfig"));
        assert!(debug_str.contains("realm"));
    }
}
