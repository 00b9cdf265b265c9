pub mod config;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use socialgeo::DemoConfig;

/// Settings that take precedence over the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// SurrealDB endpoint, e.g. ws://localhost:8000 or mem://
    #[arg(long, env = "SOCIALGEO_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Namespace to select
    #[arg(long, env = "SOCIALGEO_NAMESPACE")]
    pub namespace: Option<String>,

    /// Database to select
    #[arg(long, env = "SOCIALGEO_DATABASE")]
    pub database: Option<String>,

    /// Root user name
    #[arg(long, env = "SOCIALGEO_USERNAME")]
    pub username: Option<String>,

    /// Root password
    #[arg(long, env = "SOCIALGEO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl OverrideArgs {
    pub fn apply(self, config: &mut DemoConfig) {
        if let Some(endpoint) = self.endpoint {
            config.connection.endpoint = endpoint;
        }
        if let Some(namespace) = self.namespace {
            config.connection.namespace = namespace;
        }
        if let Some(database) = self.database {
            config.connection.database = database;
        }
        if let Some(username) = self.username {
            config.credentials.username = username;
        }
        if let Some(password) = self.password {
            config.credentials.password = password;
        }
    }
}

/// Defaults, then the file, then flags and environment.
pub fn resolve_config(path: Option<&Path>, overrides: OverrideArgs) -> Result<DemoConfig> {
    let mut config = DemoConfig::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_what_is_set() {
        let mut config = DemoConfig::default();
        OverrideArgs {
            endpoint: Some("mem://".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.connection.endpoint, "mem://");
        assert_eq!(config.credentials.password, "secret");
        assert_eq!(config.connection.namespace, "socialapp");
        assert_eq!(config.credentials.username, "root");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let overrides = OverrideArgs {
            endpoint: Some("ftp://nowhere".to_string()),
            ..Default::default()
        };
        let err = resolve_config(None, overrides).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration"));
    }
}
