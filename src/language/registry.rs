// src/language/registry.rs

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::config::model::{ConfigSection, LanguageConfig};
use crate::config::ConfigFile;
use crate::errors::{CoderunnerError, Result};

use super::builtin::BUILTIN_LANGUAGES;
use super::template::{CommandTemplate, PathTemplate};
use super::{DEFAULT_COMPILE_TIMEOUT, Language, PipelineSpec};

/// Result of looking up how to execute a language.
#[derive(Debug, Clone, Copy)]
pub enum Pipeline<'a> {
    RunOnly {
        language: &'a Language,
        run: &'a CommandTemplate,
    },
    CompileThenRun {
        language: &'a Language,
        compile: &'a CommandTemplate,
        artifact: &'a PathTemplate,
        run: &'a CommandTemplate,
        compile_timeout: Duration,
    },
    /// Unknown identifier, or a language without an execution pipeline.
    /// For unknown identifiers both fields are the name that was looked up.
    NotSupported { id: &'a str, display_name: &'a str },
}

/// Immutable language table with alias and extension indexes.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: BTreeMap<String, Language>,
    /// lowercase id or alias -> canonical id
    names: HashMap<String, String>,
    /// lowercase extension -> canonical id
    extensions: HashMap<String, String>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageRegistry {
    /// The built-in table with the default compile timeout.
    pub fn builtin() -> Self {
        Self::from_languages(builtin_languages(DEFAULT_COMPILE_TIMEOUT))
            .expect("built-in language table has unique names")
    }

    /// Build a registry from an explicit list of languages.
    ///
    /// Fails if two languages claim the same id, alias or extension.
    pub fn from_languages(languages: impl IntoIterator<Item = Language>) -> Result<Self> {
        let mut registry = Self {
            languages: BTreeMap::new(),
            names: HashMap::new(),
            extensions: HashMap::new(),
        };

        for mut lang in languages {
            lang.id = lang.id.to_lowercase();
            let id = lang.id.clone();

            claim(&mut registry.names, &id, &id, "name")?;
            for alias in &lang.aliases {
                claim(&mut registry.names, &alias.to_lowercase(), &id, "alias")?;
            }
            claim(
                &mut registry.extensions,
                &lang.extension.trim_start_matches('.').to_lowercase(),
                &id,
                "extension",
            )?;

            registry.languages.insert(id, lang);
        }

        Ok(registry)
    }

    /// Built-in table overlaid with the `[language.<id>]` sections of a
    /// validated config.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        build_languages(&cfg.config, &cfg.language).and_then(Self::from_languages)
    }

    pub fn get(&self, name: &str) -> Option<&Language> {
        let id = self.names.get(&name.trim().to_lowercase())?;
        self.languages.get(id)
    }

    /// Resolve a language from a file extension.
    pub fn language_for_path(&self, path: &Path) -> Option<&Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        let id = self.extensions.get(&ext)?;
        self.languages.get(id)
    }

    /// All languages, ordered by id.
    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.languages.values()
    }

    pub fn pipeline_for<'a>(&'a self, name: &'a str) -> Pipeline<'a> {
        let Some(language) = self.get(name) else {
            debug!(language = name, "no such language in registry");
            return Pipeline::NotSupported {
                id: name,
                display_name: name,
            };
        };

        match &language.pipeline {
            PipelineSpec::RunOnly { run } => Pipeline::RunOnly { language, run },
            PipelineSpec::CompileThenRun {
                compile,
                artifact,
                run,
                compile_timeout,
            } => Pipeline::CompileThenRun {
                language,
                compile,
                artifact,
                run,
                compile_timeout: *compile_timeout,
            },
            PipelineSpec::Unsupported => Pipeline::NotSupported {
                id: &language.id,
                display_name: &language.display_name,
            },
        }
    }
}

fn claim(index: &mut HashMap<String, String>, key: &str, id: &str, what: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CoderunnerError::ConfigError(format!(
            "language '{id}' has an empty {what}"
        )));
    }
    match index.get(key) {
        Some(owner) if owner != id => Err(CoderunnerError::ConfigError(format!(
            "{what} '{key}' is claimed by both '{owner}' and '{id}'"
        ))),
        _ => {
            index.insert(key.to_string(), id.to_string());
            Ok(())
        }
    }
}

fn builtin_languages(compile_timeout: Duration) -> Vec<Language> {
    BUILTIN_LANGUAGES
        .iter()
        .map(|b| b.to_language(compile_timeout))
        .collect()
}

/// Apply config overlays to the built-in table.
///
/// Used both by config validation and by [`LanguageRegistry::from_config`].
pub(crate) fn build_languages(
    section: &ConfigSection,
    overlays: &BTreeMap<String, LanguageConfig>,
) -> Result<Vec<Language>> {
    let compile_timeout = section.compile_timeout();

    let mut by_id: BTreeMap<String, Language> = builtin_languages(compile_timeout)
        .into_iter()
        .map(|l| (l.id.clone(), l))
        .collect();

    for (id, overlay) in overlays {
        let id = id.to_lowercase();
        let base = by_id.remove(&id);
        let lang = overlay_language(&id, base, overlay, compile_timeout).map_err(|e| {
            let detail = match e {
                CoderunnerError::ConfigError(msg) | CoderunnerError::TemplateError(msg) => msg,
                other => other.to_string(),
            };
            CoderunnerError::ConfigError(format!("[language.{id}]: {detail}"))
        })?;
        by_id.insert(id, lang);
    }

    Ok(by_id.into_values().collect())
}

fn overlay_language(
    id: &str,
    base: Option<Language>,
    cfg: &LanguageConfig,
    default_compile_timeout: Duration,
) -> Result<Language> {
    let mut lang = match base {
        Some(lang) => lang,
        None => {
            let extension = cfg.extension.clone().ok_or_else(|| {
                CoderunnerError::ConfigError("new languages need an `extension`".to_string())
            })?;
            Language {
                id: id.to_string(),
                display_name: id.to_string(),
                file_name: format!("main.{extension}"),
                extension,
                aliases: Vec::new(),
                pipeline: PipelineSpec::Unsupported,
                run_timeout: None,
            }
        }
    };

    if let Some(name) = &cfg.display_name {
        lang.display_name = name.clone();
    }
    if let Some(ext) = &cfg.extension {
        lang.extension = ext.trim_start_matches('.').to_string();
    }
    if let Some(file_name) = &cfg.file_name {
        lang.file_name = file_name.clone();
    }
    if let Some(aliases) = &cfg.aliases {
        lang.aliases = aliases.clone();
    }
    if let Some(secs) = cfg.run_timeout_secs {
        lang.run_timeout = Some(Duration::from_secs(secs));
    }

    let compile_timeout = cfg
        .compile_timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(default_compile_timeout);

    if cfg.compile.is_some() || cfg.artifact.is_some() || cfg.run.is_some() {
        lang.pipeline = match (&cfg.compile, &cfg.artifact, &cfg.run) {
            (None, None, Some(run)) => PipelineSpec::RunOnly {
                run: CommandTemplate::parse(run.iter().cloned())?,
            },
            (Some(compile), Some(artifact), Some(run)) => PipelineSpec::CompileThenRun {
                compile: CommandTemplate::parse(compile.iter().cloned())?,
                artifact: PathTemplate::parse(artifact.clone())?,
                run: CommandTemplate::parse(run.iter().cloned())?,
                compile_timeout,
            },
            (Some(_), None, _) => {
                return Err(CoderunnerError::ConfigError(
                    "`compile` requires an `artifact` path".to_string(),
                ));
            }
            (None, Some(_), _) => {
                return Err(CoderunnerError::ConfigError(
                    "`artifact` is only meaningful together with `compile`".to_string(),
                ));
            }
            (_, _, None) => {
                return Err(CoderunnerError::ConfigError(
                    "a pipeline needs a `run` command".to_string(),
                ));
            }
        };
    } else if let PipelineSpec::CompileThenRun {
        compile_timeout: current,
        ..
    } = &mut lang.pipeline
    {
        *current = compile_timeout;
    }

    if cfg.enabled == Some(false) {
        lang.pipeline = PipelineSpec::Unsupported;
    }

    Ok(lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::PipelineKind;

    #[test]
    fn lookup_by_id_alias_and_case() {
        let reg = LanguageRegistry::builtin();
        assert_eq!(reg.get("cpp").unwrap().display_name, "C++");
        assert_eq!(reg.get("C++").unwrap().id, "cpp");
        assert_eq!(reg.get(" Py ").unwrap().id, "python");
        assert!(reg.get("cobol").is_none());
    }

    #[test]
    fn lookup_by_extension() {
        let reg = LanguageRegistry::builtin();
        assert_eq!(
            reg.language_for_path(Path::new("src/Main.JAVA")).unwrap().id,
            "java"
        );
        assert!(reg.language_for_path(Path::new("Makefile")).is_none());
    }

    #[test]
    fn pipelines_by_kind() {
        let reg = LanguageRegistry::builtin();
        assert!(matches!(reg.pipeline_for("python"), Pipeline::RunOnly { .. }));
        match reg.pipeline_for("java") {
            Pipeline::CompileThenRun {
                compile_timeout, ..
            } => assert_eq!(compile_timeout, DEFAULT_COMPILE_TIMEOUT),
            other => panic!("expected compiled pipeline, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_reports_display_name_or_raw_id() {
        let reg = LanguageRegistry::builtin();
        assert!(matches!(
            reg.pipeline_for("RB"),
            Pipeline::NotSupported {
                id: "ruby",
                display_name: "Ruby"
            }
        ));
        assert!(matches!(
            reg.pipeline_for("brainfuck"),
            Pipeline::NotSupported {
                id: "brainfuck",
                display_name: "brainfuck"
            }
        ));
        assert!(!reg.get("markdown").unwrap().supports_execution());
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let mut langs = builtin_languages(DEFAULT_COMPILE_TIMEOUT);
        langs[0].aliases.push("js".to_string());
        let err = LanguageRegistry::from_languages(langs).unwrap_err();
        assert!(err.to_string().contains("'js'"));
    }

    #[test]
    fn overlay_turns_unsupported_language_into_interpreted() {
        let mut overlays = BTreeMap::new();
        overlays.insert(
            "ruby".to_string(),
            LanguageConfig {
                run: Some(vec!["ruby".to_string(), "{source}".to_string()]),
                ..Default::default()
            },
        );
        let langs = build_languages(&ConfigSection::default(), &overlays).unwrap();
        let reg = LanguageRegistry::from_languages(langs).unwrap();
        assert_eq!(reg.get("rb").unwrap().kind(), PipelineKind::Interpreted);
    }

    #[test]
    fn overlay_can_disable_a_language() {
        let mut overlays = BTreeMap::new();
        overlays.insert(
            "python".to_string(),
            LanguageConfig {
                enabled: Some(false),
                ..Default::default()
            },
        );
        let langs = build_languages(&ConfigSection::default(), &overlays).unwrap();
        let reg = LanguageRegistry::from_languages(langs).unwrap();
        assert!(matches!(
            reg.pipeline_for("python"),
            Pipeline::NotSupported {
                display_name: "Python",
                ..
            }
        ));
    }
}
