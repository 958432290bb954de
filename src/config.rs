use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::HarvestError;

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const DEFAULT_TOOL: &str = "gene-harvester";
pub const CONFIG_FILE_NAME: &str = "gene-harvester.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub contact: Option<String>,
    pub base_url: String,
    pub tool: String,
    pub timeout: Option<Duration>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the explicit path if given, otherwise the first config file found in
    /// the working directory or the user config directory, otherwise defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HarvestError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::discover(),
        };
        let Some(config_path) = config_path else {
            debug!("no config file found, using defaults");
            return Ok(ResolvedConfig::default());
        };
        Self::load(&config_path)
    }

    pub fn load(path: &Path) -> Result<ResolvedConfig, HarvestError> {
        debug!(path = %path.display(), "reading config");
        let content =
            fs::read_to_string(path).map_err(|_| HarvestError::ConfigRead(path.to_path_buf()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| HarvestError::ConfigParse(err.to_string()))?;
        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        ResolvedConfig {
            contact: config
                .contact
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            base_url: config
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            tool: config.tool.unwrap_or_else(|| DEFAULT_TOOL.to_string()),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "gene-harvester")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .filter(|path| path.exists())
    }
}

/// Picks the contact from the command line first, then from the config.
pub fn resolve_contact(
    cli: Option<String>,
    config: &ResolvedConfig,
) -> Result<String, HarvestError> {
    let contact = cli
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| config.contact.clone())
        .ok_or(HarvestError::MissingContact)?;
    if !looks_like_email(&contact) {
        warn!(%contact, "contact does not look like an email address; NCBI may throttle anonymous use");
    }
    Ok(contact)
}

pub fn looks_like_email(value: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"))
        .is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.tool, DEFAULT_TOOL);
        assert_eq!(resolved.contact, None);
        assert_eq!(resolved.timeout, None);
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("someone@example.org"));
        assert!(!looks_like_email("someone"));
        assert!(!looks_like_email("a b@example.org"));
    }
}
