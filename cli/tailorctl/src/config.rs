//! Config files for the CLI: endpoints, saved context, credentials.
//!
//! Everything lives under the per-user config directory as JSON. The
//! credentials file holds a bearer token and is written with owner-only
//! permissions on Unix.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.json";
const CREDENTIALS_FILE: &str = "credentials.json";

fn config_path(file: &str) -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "vmtailor", "vmt")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dirs.config_dir().join(file))
}

/// Read and parse a JSON config file, or None when it does not exist.
fn read_json<T: DeserializeOwned>(file: &str) -> Result<Option<T>> {
    let path = config_path(file)?;
    if !path.exists() {
        return Ok(None);
    }

    let contents =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(parsed))
}

/// Serialize a value to a JSON config file, creating the directory as
/// needed. The file ends up readable only by the owner on Unix.
fn write_json<T: Serialize>(file: &str, value: &T) -> Result<()> {
    let path = config_path(file)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let contents = serde_json::to_string_pretty(value)?;
    write_private(&path, &contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(unix)]
fn write_private(path: &std::path::Path, contents: &str) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &std::path::Path, contents: &str) -> Result<()> {
    fs::write(path, contents)?;
    Ok(())
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Compute Engine API endpoint.
    #[serde(default = "default_compute_url")]
    pub compute_url: String,

    /// Recommender API endpoint.
    #[serde(default = "default_recommender_url")]
    pub recommender_url: String,

    /// Saved defaults applied when flags are omitted.
    #[serde(default)]
    pub context: CliContext,
}

fn default_compute_url() -> String {
    std::env::var("VMT_COMPUTE_URL")
        .unwrap_or_else(|_| vmtailor_gcp::DEFAULT_COMPUTE_URL.to_string())
}

fn default_recommender_url() -> String {
    std::env::var("VMT_RECOMMENDER_URL")
        .unwrap_or_else(|_| vmtailor_gcp::DEFAULT_RECOMMENDER_URL.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compute_url: default_compute_url(),
            recommender_url: default_recommender_url(),
            context: CliContext::default(),
        }
    }
}

impl Config {
    /// Load the config file, or defaults when it is missing.
    pub fn load() -> Result<Self> {
        Ok(read_json(CONFIG_FILE)?.unwrap_or_default())
    }

    /// Persist the config file.
    pub fn save(&self) -> Result<()> {
        write_json(CONFIG_FILE, self)
    }
}

/// Saved defaults for project, zone, and recommender location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliContext {
    /// Project ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Zone, e.g. `us-central1-a`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Recommender location. Machine-type recommendations are zonal, so
    /// this falls back to the zone when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Stored bearer token for the provider APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Access token sent as `Authorization: Bearer`.
    pub token: String,

    /// Account the token belongs to (informational).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// When the token stops working, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Credentials {
    /// Credentials holding just a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: None,
            expires_at: None,
        }
    }

    /// Load stored credentials, if any.
    pub fn load() -> Result<Option<Self>> {
        read_json(CREDENTIALS_FILE)
    }

    /// Persist the credentials file.
    pub fn save(&self) -> Result<()> {
        write_json(CREDENTIALS_FILE, self)
    }

    /// Remove stored credentials. Returns false when none were stored.
    pub fn delete() -> Result<bool> {
        let path = config_path(CREDENTIALS_FILE)?;
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).with_context(|| format!("Failed to delete {}", path.display()))?;
        Ok(true)
    }

    /// Whether the token's recorded expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| chrono::Utc::now() >= at)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.compute_url.is_empty());
        assert!(!config.recommender_url.is_empty());
        assert!(config.context.project.is_none());
    }

    #[test]
    fn test_credentials_expiry() {
        let mut creds = Credentials::new("test-token");
        assert_eq!(creds.token, "test-token");
        assert!(!creds.is_expired());

        creds.expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(1));
        assert!(creds.is_expired());

        creds.expires_at = Some(chrono::Utc::now() + chrono::Duration::minutes(30));
        assert!(!creds.is_expired());
    }

    #[test]
    fn test_context_roundtrip() {
        let context = CliContext {
            project: Some("p1".to_string()),
            zone: Some("us-central1-a".to_string()),
            location: None,
        };

        let json = serde_json::to_string(&context).unwrap();
        assert!(!json.contains("location"));

        let parsed: CliContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.project.as_deref(), Some("p1"));
        assert_eq!(parsed.zone.as_deref(), Some("us-central1-a"));
    }
}
