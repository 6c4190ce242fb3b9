// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CoderunnerError, Result};
use crate::language::LanguageRegistry;
use crate::language::registry::build_languages;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CoderunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.language))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_languages(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.run_timeout_secs == 0 {
        return Err(CoderunnerError::ConfigError(
            "[config].run_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.compile_timeout_secs == 0 {
        return Err(CoderunnerError::ConfigError(
            "[config].compile_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.workspace_dir.as_os_str().is_empty() {
        return Err(CoderunnerError::ConfigError(
            "[config].workspace_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_languages(cfg: &RawConfigFile) -> Result<()> {
    for (id, lang) in cfg.language.iter() {
        if lang.run_timeout_secs == Some(0) || lang.compile_timeout_secs == Some(0) {
            return Err(CoderunnerError::ConfigError(format!(
                "[language.{id}]: timeouts must be >= 1 second"
            )));
        }
    }

    // Building the table checks templates, pipeline shape and name clashes.
    let languages = build_languages(&cfg.config, &cfg.language)?;
    LanguageRegistry::from_languages(languages)?;
    Ok(())
}
