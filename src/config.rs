use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::Result;
use crate::models::TargetId;

/// Credentials and base URL for one retail target. Immutable after load.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub url: String,
    pub username: String,
    pub pwd: String,
}

/// All configured targets, loaded once from an INI file with one section
/// per target and exactly the keys `url`, `username`, `pwd`.
#[derive(Debug, Clone)]
pub struct TargetStore {
    targets: HashMap<String, TargetConfig>,
}

impl TargetStore {
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()?;

        let targets: HashMap<String, TargetConfig> = settings.try_deserialize()?;
        let store = Self { targets };
        store.validate()?;
        Ok(store)
    }

    pub fn get(&self, target: TargetId) -> Result<&TargetConfig> {
        self.targets.get(target.section()).ok_or_else(|| {
            ConfigError::Message(format!("missing [{}] section", target.section())).into()
        })
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, target) in &self.targets {
            if Url::parse(&target.url).is_err() {
                return Err(ConfigError::Message(format!("invalid url in [{name}]")));
            }
            if target.username.is_empty() {
                return Err(ConfigError::Message(format!("empty username in [{name}]")));
            }
            if target.pwd.is_empty() {
                return Err(ConfigError::Message(format!("empty pwd in [{name}]")));
            }
        }
        Ok(())
    }
}

/// Browser session settings. Not part of the target file: headless mode
/// comes from the entry point and the Chrome binary from the environment.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_path: Option<String>,
    /// Bounded wait applied to every element lookup.
    pub wait_timeout: Duration,
}

impl BrowserConfig {
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            chrome_path: env::var("CHROME_PATH").ok(),
            wait_timeout: Duration::from_secs(4),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::new(true)
    }
}
