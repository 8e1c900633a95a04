//! `mend.toml` configuration
//!
//! Every section is optional. Environment overrides are applied by
//! [`MendConfig::apply_env`]; the API token is only ever read from the
//! environment variable named by `remote.token_env`.

use mend_batch::{BatchError, FileSet};
use mend_core::{compile_specs, presets, FieldRemoval, RuleError, RuleSet, RuleSpec};
use mend_document::{CodeEdit, KeyFilter, NodeSelector, PatchPlan, DEFAULT_CODE_FIELD};
use mend_remote::{RemoteConfig, WorkflowRef, DEFAULT_AUTH_HEADER};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file used when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "mend.toml";

/// Environment variable overriding `remote.base_url`
pub const ENV_BASE_URL: &str = "MEND_BASE_URL";

/// Environment variable overriding `remote.timeout_secs`
pub const ENV_TIMEOUT_SECS: &str = "MEND_TIMEOUT_SECS";

/// Configuration errors, reported with the offending path or key
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A value is present but unusable
    #[error("invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },

    /// A required value is absent
    #[error("missing '{0}'")]
    Missing(String),

    /// Rules under `key` did not compile
    #[error("rules in '{key}': {source}")]
    Rule {
        key: String,
        #[source]
        source: RuleError,
    },

    /// Glob patterns under `key` did not compile
    #[error("file set in '{key}': {source}")]
    FileSet {
        key: String,
        #[source]
        source: BatchError,
    },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }

    fn rule(key: impl Into<String>, source: RuleError) -> Self {
        Self::Rule {
            key: key.into(),
            source,
        }
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MendConfig {
    /// Remote workflow API
    #[serde(default)]
    pub remote: RemoteSection,
    /// Edits applied to workflow code nodes
    #[serde(default)]
    pub code_edits: Vec<CodeEditSpec>,
    /// Static-site batch edits
    #[serde(default)]
    pub site: SiteSection,
    /// Encoding repair over documents
    #[serde(default)]
    pub encoding: EncodingSection,
}

/// `[remote]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    /// Collection URL; documents live at `{base_url}/{id}`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Header carrying the token
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    /// Environment variable holding the token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Per-request deadline
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Documents patched by `patch-remote`
    #[serde(default)]
    pub workflows: Vec<WorkflowRef>,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_header: default_auth_header(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            workflows: Vec::new(),
        }
    }
}

fn default_auth_header() -> String {
    DEFAULT_AUTH_HEADER.to_string()
}

fn default_token_env() -> String {
    "MEND_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// `[[code_edits]]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeEditSpec {
    /// Select by node id
    #[serde(default)]
    pub node_id: Option<String>,
    /// Select by exact node name
    #[serde(default)]
    pub node_name: Option<String>,
    /// Select by node name fragment
    #[serde(default)]
    pub node_name_contains: Option<String>,
    /// `parameters` entry to edit
    #[serde(default = "default_field")]
    pub field: String,
    /// Prompt fields removed with the concatenation-template model
    #[serde(default)]
    pub remove_fields: Vec<String>,
    /// Built-in rule sets
    #[serde(default)]
    pub presets: Vec<String>,
    /// Inline rules
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

fn default_field() -> String {
    DEFAULT_CODE_FIELD.to_string()
}

impl CodeEditSpec {
    /// The single selector this entry names
    ///
    /// # Errors
    /// `Invalid` unless exactly one of `node_id`, `node_name` and
    /// `node_name_contains` is set.
    pub fn selector(&self, key: &str) -> Result<NodeSelector, ConfigError> {
        let mut selectors = [
            self.node_id.clone().map(NodeSelector::Id),
            self.node_name.clone().map(NodeSelector::Name),
            self.node_name_contains.clone().map(NodeSelector::NameContains),
        ]
        .into_iter()
        .flatten();
        match (selectors.next(), selectors.next()) {
            (Some(selector), None) => Ok(selector),
            (None, _) => Err(ConfigError::invalid(
                key,
                "one of node_id, node_name or node_name_contains is required",
            )),
            (Some(_), Some(_)) => Err(ConfigError::invalid(key, "only one node selector may be set")),
        }
    }

    /// Field removals first, then presets, then inline rules
    ///
    /// # Errors
    /// `Rule` for an unknown preset, bad field name or bad pattern.
    pub fn rule_set(&self, key: &str) -> Result<RuleSet, ConfigError> {
        let mut rules = RuleSet::new();
        for field in &self.remove_fields {
            rules.push(FieldRemoval::new(field.clone()).map_err(|e| ConfigError::rule(key, e))?);
        }
        rules.extend(presets(&self.presets).map_err(|e| ConfigError::rule(key, e))?);
        rules.extend(compile_specs(&self.rules).map_err(|e| ConfigError::rule(key, e))?);
        Ok(rules)
    }

    /// Compile into a [`CodeEdit`]
    ///
    /// # Errors
    /// See [`Self::selector`] and [`Self::rule_set`].
    pub fn to_code_edit(&self, key: &str) -> Result<CodeEdit, ConfigError> {
        Ok(CodeEdit::new(self.selector(key)?, self.rule_set(key)?).with_field(self.field.clone()))
    }
}

/// `[site]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Directory walked by `edit-site`
    #[serde(default = "default_site_root")]
    pub root: PathBuf,
    /// Globs selecting files
    #[serde(default = "default_site_include")]
    pub include: Vec<String>,
    /// Globs excluding files
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Built-in rule sets
    #[serde(default)]
    pub presets: Vec<String>,
    /// Inline rules
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            root: default_site_root(),
            include: default_site_include(),
            exclude: Vec::new(),
            presets: Vec::new(),
            rules: Vec::new(),
        }
    }
}

fn default_site_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_site_include() -> Vec<String> {
    vec!["*.html".to_string()]
}

impl SiteSection {
    /// Presets, then inline rules
    ///
    /// # Errors
    /// `Rule` for an unknown preset or bad pattern.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let mut rules = presets(&self.presets).map_err(|e| ConfigError::rule("site.presets", e))?;
        rules.extend(compile_specs(&self.rules).map_err(|e| ConfigError::rule("site.rules", e))?);
        Ok(rules)
    }

    /// Files to edit: `files` when given, else the globbed root
    ///
    /// # Errors
    /// `FileSet` when a glob does not compile.
    pub fn file_set(&self, root: Option<&Path>, files: Vec<PathBuf>) -> Result<FileSet, ConfigError> {
        if !files.is_empty() {
            return Ok(FileSet::explicit(files));
        }
        let root = root.unwrap_or(self.root.as_path());
        FileSet::glob(root, &self.include, &self.exclude).map_err(|source| ConfigError::FileSet {
            key: "site".to_string(),
            source,
        })
    }
}

/// `[encoding]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncodingSection {
    /// Keys whose strings are repaired; empty repairs every string
    #[serde(default)]
    pub keys: Vec<String>,
}

impl MendConfig {
    /// Parse TOML text; `origin` names the source in errors
    ///
    /// # Errors
    /// `Parse` with the TOML diagnostic.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from `path`, or from `./mend.toml` when `path` is `None`
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    ///
    /// # Errors
    /// `Read` or `Parse`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let config = Self::parse(&text, &path)?;
                tracing::debug!(path = %path.display(), "config loaded");
                Ok(config)
            }
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Apply `MEND_BASE_URL` and `MEND_TIMEOUT_SECS` from `lookup`
    ///
    /// # Errors
    /// `Invalid` when the timeout is not a whole number of seconds.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.remote.base_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.remote.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(ENV_TIMEOUT_SECS, format!("'{raw}': {e}")))?;
        }
        Ok(())
    }

    /// Every `[[code_edits]]` entry as one plan
    ///
    /// # Errors
    /// First invalid entry, keyed as `code_edits[i]`.
    pub fn patch_plan(&self) -> Result<PatchPlan, ConfigError> {
        let edits = self
            .code_edits
            .iter()
            .enumerate()
            .map(|(i, spec)| spec.to_code_edit(&format!("code_edits[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PatchPlan::new(edits))
    }

    /// Key filter for `repair-encoding`; `keys` overrides `[encoding]`
    #[must_use]
    pub fn key_filter(&self, keys: Vec<String>) -> KeyFilter {
        if keys.is_empty() {
            KeyFilter::from_keys(self.encoding.keys.clone())
        } else {
            KeyFilter::from_keys(keys)
        }
    }

    /// Remote settings with the token taken from `lookup(token_env)`
    ///
    /// # Errors
    /// `Missing` without a base URL or token; `Invalid` for a zero timeout.
    pub fn remote_config<F>(&self, lookup: F) -> Result<RemoteConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let remote = &self.remote;
        let base_url = remote
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing("remote.base_url".to_string()))?;
        if remote.timeout_secs == 0 {
            return Err(ConfigError::invalid("remote.timeout_secs", "must be at least 1"));
        }
        let token = lookup(&remote.token_env)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConfigError::Missing(format!("environment variable {}", remote.token_env)))?;
        Ok(RemoteConfig::new(base_url, token)
            .with_auth_header(remote.auth_header.clone())
            .with_timeout(Duration::from_secs(remote.timeout_secs)))
    }

    /// Workflows to patch: `ids` when given, else `[remote].workflows`
    ///
    /// Ids that are also configured keep their configured name.
    #[must_use]
    pub fn workflows(&self, ids: &[String]) -> Vec<WorkflowRef> {
        if ids.is_empty() {
            return self.remote.workflows.clone();
        }
        ids.iter()
            .map(|id| {
                self.remote
                    .workflows
                    .iter()
                    .find(|w| &w.id == id)
                    .cloned()
                    .unwrap_or_else(|| WorkflowRef::new(id.clone()))
            })
            .collect()
    }
}
