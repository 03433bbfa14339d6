//! Compiler options, loadable from YAML or JSON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rules::DEFAULT_RULES;
use crate::syntax::ParseOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown rule \"{0}\"")]
    UnknownRule(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Indented blocks after a trailing `:` become nested roots.
    pub multiline: bool,
    pub keep_comments: bool,
    /// Executable-less nodes without children redirect to the root.
    pub legacy_root_redirect: bool,
    /// Extra command tree documents merged over the bundled grammar.
    pub grammars: Vec<PathBuf>,
    /// Enabled rule names; `None` enables the default set.
    pub rules: Option<Vec<String>>,
    /// Spaces per nesting level when printing nested blocks.
    pub indent: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            multiline: false,
            keep_comments: false,
            legacy_root_redirect: true,
            grammars: Vec::new(),
            rules: None,
            indent: 4,
        }
    }
}

impl CompilerOptions {
    /// Loads options from `path`, as JSON for `.json` files and YAML otherwise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut options = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        // Grammar paths are relative to the config file.
        if let Some(base) = path.parent() {
            for grammar in &mut options.grammars {
                if grammar.is_relative() {
                    *grammar = base.join(&*grammar);
                }
            }
        }
        Ok(options)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            multiline: self.multiline,
            keep_comments: self.keep_comments,
        }
    }

    pub fn rule_enabled(&self, name: &str) -> bool {
        self.rules
            .as_ref()
            .map_or(DEFAULT_RULES.contains(&name), |rules| {
                rules.iter().any(|rule| rule == name)
            })
    }
}
