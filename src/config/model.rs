// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::DuplicateRunPolicy;

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [config]
/// workspace_dir = ".coderunner"
/// run_timeout_secs = 60
/// compile_timeout_secs = 30
/// on_duplicate = "supersede"
///
/// [language.ruby]
/// run = ["ruby", "{source}"]
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Overrides and additions to the built-in language table, keyed by id.
    #[serde(default)]
    pub language: BTreeMap<String, LanguageConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub language: BTreeMap<String, LanguageConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        language: BTreeMap<String, LanguageConfig>,
    ) -> Self {
        Self { config, language }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(ConfigSection::default(), BTreeMap::new())
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Root under which each key gets its own build directory.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,

    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    #[serde(default = "default_compile_timeout_secs")]
    pub compile_timeout_secs: u64,

    /// `"supersede"` (default) or `"reject"`.
    #[serde(default)]
    pub on_duplicate: DuplicateRunPolicy,
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from(".coderunner")
}

fn default_run_timeout_secs() -> u64 {
    60
}

fn default_compile_timeout_secs() -> u64 {
    30
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
            run_timeout_secs: default_run_timeout_secs(),
            compile_timeout_secs: default_compile_timeout_secs(),
            on_duplicate: DuplicateRunPolicy::default(),
        }
    }
}

impl ConfigSection {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }
}

/// `[language.<id>]` section.
///
/// Every field is optional so an entry can tweak a single aspect of a
/// built-in language. Giving any of `compile`, `artifact` or `run` replaces
/// the whole pipeline.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LanguageConfig {
    #[serde(default)]
    pub display_name: Option<String>,

    /// Required for languages that are not built in.
    #[serde(default)]
    pub extension: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,

    #[serde(default)]
    pub aliases: Option<Vec<String>>,

    #[serde(default)]
    pub compile: Option<Vec<String>>,

    #[serde(default)]
    pub artifact: Option<String>,

    #[serde(default)]
    pub run: Option<Vec<String>>,

    #[serde(default)]
    pub compile_timeout_secs: Option<u64>,

    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    /// `false` keeps the language listed but makes it non-executable.
    #[serde(default)]
    pub enabled: Option<bool>,
}
