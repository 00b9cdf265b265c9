//! Tour configuration.
//!
//! Every field has a default, so an empty or missing file yields the
//! configuration of the classic demo: `ws://localhost:8000`, namespace
//! `socialapp`, database `main`, root/root credentials, Paris as reference
//! point. String values of the form `${VAR}` are read from the environment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{DemoError, Result};
use crate::geo::GeoPoint;
use crate::types::Credentials;
use crate::validators::{SUPPORTED_SCHEMES, is_supported_endpoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub credentials: CredentialSettings,
    #[serde(default)]
    pub geo: GeoSettings,
    #[serde(default)]
    pub live: LiveSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            namespace: default_namespace(),
            database: default_database(),
        }
    }
}

fn default_endpoint() -> String {
    "ws://localhost:8000".to_string()
}

fn default_namespace() -> String {
    "socialapp".to_string()
}

fn default_database() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSettings {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

fn default_username() -> String {
    "root".to_string()
}

fn default_password() -> String {
    "root".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSettings {
    #[serde(default = "default_reference")]
    pub reference: Coordinates,
    /// Upper bound (exclusive) of the geospatial search, in metres.
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            radius_m: default_radius_m(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl From<Coordinates> for GeoPoint {
    fn from(value: Coordinates) -> Self {
        GeoPoint::new(value.longitude, value.latitude)
    }
}

fn default_reference() -> Coordinates {
    Coordinates {
        longitude: 2.3522,
        latitude: 48.8566,
    }
}

fn default_radius_m() -> f64 {
    10_000_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSettings {
    /// Wait for the live query to be registered before the like increment.
    #[serde(default)]
    pub wait_for_ready: bool,
    /// How long to keep listening for notifications before shutting the subscription down.
    #[serde(default = "default_drain_ms")]
    pub drain_ms: u64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            wait_for_ready: false,
            drain_ms: default_drain_ms(),
        }
    }
}

fn default_drain_ms() -> u64 {
    200
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Treat a failed session invalidation as a fatal error.
    #[serde(default = "default_cleanup_failure_fatal")]
    pub cleanup_failure_fatal: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cleanup_failure_fatal: default_cleanup_failure_fatal(),
        }
    }
}

fn default_cleanup_failure_fatal() -> bool {
    true
}

impl DemoConfig {
    /// Loads the configuration from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|err| DemoError::config(format!("failed to read {}: {err}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: DemoConfig =
            toml::from_str(content).map_err(|err| DemoError::config(format!("failed to parse config: {err}")))?;
        config.expand_env()?;
        Ok(config)
    }

    /// Replaces `${VAR}` values with the environment variable they name.
    pub fn expand_env(&mut self) -> Result<()> {
        for value in [
            &mut self.connection.endpoint,
            &mut self.connection.namespace,
            &mut self.connection.database,
            &mut self.credentials.username,
            &mut self.credentials.password,
        ] {
            *value = expand_env_value(value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !is_supported_endpoint(&self.connection.endpoint) {
            return Err(DemoError::config(format!(
                "endpoint `{}` must be a URL with one of the schemes {SUPPORTED_SCHEMES:?}",
                self.connection.endpoint
            )));
        }
        if self.connection.namespace.trim().is_empty() || self.connection.database.trim().is_empty() {
            return Err(DemoError::config("namespace and database must not be empty"));
        }
        if self.credentials.username.is_empty() {
            return Err(DemoError::config("username must not be empty"));
        }
        let issues = GeoPoint::from(self.geo.reference).check("geo.reference");
        if let Some(issue) = issues.first() {
            return Err(DemoError::config(format!("{}: {}", issue.field, issue.message)));
        }
        if !(self.geo.radius_m > 0.0) {
            return Err(DemoError::config("geo.radius_m must be positive"));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.credentials.username, &self.credentials.password)
    }

    pub fn reference_point(&self) -> GeoPoint {
        self.geo.reference.into()
    }

    /// A copy with the password masked.
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        redacted.credentials.password = "********".to_string();
        redacted
    }

    /// Renders the configuration as TOML with the password masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.redacted()).map_err(|err| DemoError::config(format!("failed to render config: {err}")))
    }
}

fn expand_env_value(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).map_err(|_| DemoError::config(format!("environment variable {var_name} not set")))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_demo() {
        let config = DemoConfig::default();
        assert_eq!(config.connection.endpoint, "ws://localhost:8000");
        assert_eq!(config.connection.namespace, "socialapp");
        assert_eq!(config.connection.database, "main");
        assert_eq!(config.credentials(), Credentials::new("root", "root"));
        assert_eq!(config.reference_point(), GeoPoint::new(2.3522, 48.8566));
        assert_eq!(config.geo.radius_m, 10_000_000.0);
        assert!(config.session.cleanup_failure_fatal);
        assert!(!config.live.wait_for_ready);
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = DemoConfig::from_toml(
            r#"
            [connection]
            endpoint = "mem://"

            [live]
            wait_for_ready = true
            "#,
        )
        .unwrap();
        assert_eq!(config.connection.endpoint, "mem://");
        assert_eq!(config.connection.namespace, "socialapp");
        assert!(config.live.wait_for_ready);
        assert_eq!(config.live.drain_ms, 200);
    }

    #[test]
    fn expands_environment_placeholders() {
        let var = "SOCIALGEO_TEST_PASSWORD_EXPANSION";
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var(var, "s3cret") };
        let config = DemoConfig::from_toml(&format!("[credentials]\npassword = \"${{{var}}}\"\n")).unwrap();
        assert_eq!(config.credentials.password, "s3cret");

        let missing = DemoConfig::from_toml("[credentials]\npassword = \"${SOCIALGEO_TEST_UNSET_VARIABLE}\"\n");
        assert!(matches!(missing, Err(DemoError::Config { .. })));
    }

    #[test]
    fn rejects_inconsistent_settings() {
        let mut config = DemoConfig::default();
        config.connection.endpoint = "redis://localhost".to_string();
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.geo.radius_m = 0.0;
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.geo.reference.latitude = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn redacted_rendering_hides_password() {
        let rendered = DemoConfig::default().to_redacted_toml().unwrap();
        assert!(rendered.contains("endpoint = \"ws://localhost:8000\""));
        assert!(rendered.contains("********"));
        assert!(!rendered.contains("password = \"root\""));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("socialgeo.toml");
        std::fs::write(&path, "[connection]\ndatabase = \"staging\"\n").unwrap();
        let config = DemoConfig::load(Some(&path)).unwrap();
        assert_eq!(config.connection.database, "staging");

        let missing = DemoConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(missing.is_err());
    }
}
