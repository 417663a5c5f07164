//! Layered configuration for shuffler.
//!
//! Sources, later ones winning:
//!
//! 1. [`Config::default()`],
//! 2. `config.toml`, `config.yaml` and `config.json` in the platform config
//!    directory, or a single explicitly named file instead,
//! 3. `SHUFFLER_*` environment variables (`SHUFFLER_MIN_WEIGHT=3`,
//!    `SHUFFLER_TAGS=[cats,dogs]`).
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = shuffler_config::Config::load(None).map_err(|e| format!("{e:?}"))?;
//! println!("{:?}", config.root);
//! # Ok(())
//! # }
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "SHUFFLER_";
/// File stem looked for in the platform config directory.
const CONFIG_STEM: &str = "config";

/// Everything the store and the command-line front end can be told.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library root holding `upcoming/` and `shown/`. Must be absolute.
    pub root: Option<PathBuf>,
    /// Directories rated below this are never drawn.
    pub min_weight: u32,
    /// Only draw from directories carrying all of these tags.
    pub tags: Vec<String>,
    /// Give unrated (`not-shown`) images a chance alongside rated ones.
    pub include_not_shown: bool,
    /// Upper bound on the recent-history window. At one image a minute, 240
    /// is four hours.
    pub recents_ceiling: usize,
    /// Selection attempts before giving up and forgetting recent history.
    pub max_attempts: usize,
    /// Remove empty category directories from `upcoming/` at startup.
    pub prune_on_start: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            min_weight: 1,
            tags: Vec::new(),
            include_not_shown: true,
            recents_ceiling: 240,
            max_attempts: 20,
            prune_on_start: true,
        }
    }
}

impl Config {
    /// Platform configuration directory (`~/.config/shuffler` and friends).
    pub fn default_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "shuffler").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Assemble the provider stack without extracting it, so callers can
    /// merge their own overrides (command-line flags) on top.
    ///
    /// With `explicit` set, only that file is read (its format chosen by
    /// extension, TOML if unknown) and it must exist. Otherwise every
    /// `config.*` in [`default_dir`](Self::default_dir) is merged; missing
    /// files are skipped.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::Invalid(format!("config file not found: {}", path.display())));
                }
                tracing::debug!(path = %path.display(), "Reading configuration file");
                figment = match path.extension().and_then(|ext| ext.to_str()) {
                    Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                    Some("json") => figment.merge(Json::file_exact(path)),
                    _ => figment.merge(Toml::file_exact(path)),
                };
            },
            None => {
                if let Some(dir) = Self::default_dir() {
                    tracing::debug!(dir = %dir.display(), "Looking for configuration files");
                    figment = figment
                        .merge(Toml::file_exact(dir.join(CONFIG_STEM).with_extension("toml")))
                        .merge(Yaml::file_exact(dir.join(CONFIG_STEM).with_extension("yaml")))
                        .merge(Json::file_exact(dir.join(CONFIG_STEM).with_extension("json")));
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extract and validate a configuration from an assembled provider stack.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default sources (or one explicit file) and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(explicit)?)
    }

    /// Reject settings the store can't work with.
    pub fn validate(&self) -> Result<()> {
        match &self.root {
            None => exn::bail!(ErrorKind::Invalid("no library root configured".to_string())),
            Some(root) if !root.is_absolute() => {
                exn::bail!(ErrorKind::Invalid(format!("library root must be absolute: {}", root.display())))
            },
            Some(_) => {},
        }
        if self.min_weight == 0 {
            exn::bail!(ErrorKind::Invalid("min_weight must be at least 1".to_string()));
        }
        if self.max_attempts == 0 {
            exn::bail!(ErrorKind::Invalid("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// The validated library root.
    ///
    /// # Errors
    /// Fails the same way [`validate`](Self::validate) does when no root is set.
    pub fn root(&self) -> Result<&Path> {
        match &self.root {
            Some(root) => Ok(root),
            None => exn::bail!(ErrorKind::Invalid("no library root configured".to_string())),
        }
    }
}
