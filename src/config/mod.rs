//! Configuration loading and management for comment-style
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to validated domain settings
//! - Default targets and conventions are embedded here, not in the CLI
//! - Targets pair path globs with the comment markers used to scan them

use crate::domain::violations::{RuleId, StyleError, StyleResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File names probed when no configuration path is given
pub const DEFAULT_CONFIG_FILES: [&str; 3] =
    ["comment_style.yaml", "comment_style.yml", ".comment_style.yaml"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentStyleConfig {
    /// Configuration format version
    pub version: String,
    /// Discovery-wide path filtering
    #[serde(default)]
    pub paths: PathConfig,
    /// Conventions shared by every target
    #[serde(default)]
    pub conventions: Conventions,
    /// File sets and the markers used to scan them
    pub targets: Vec<TargetConfig>,
}

/// Path filtering applied while discovering files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Exclude patterns (gitignore-style, `!` re-includes)
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Optional per-directory ignore file name
    pub ignore_file: Option<String>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                "target/".to_string(),
                "**/node_modules/".to_string(),
                "**/.git/".to_string(),
                "**/vendor/".to_string(),
            ],
            ignore_file: Some(".commentstyleignore".to_string()),
        }
    }
}

/// How annotation tags treat a colon after the tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagColon {
    /// `// TODO Fix.`
    #[default]
    Forbidden,
    /// `// TODO: Fix.`
    Required,
    /// Either form
    Optional,
}

/// Style conventions that shape how comments are read
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    /// Spaces after the conventional one that turn a line into a code block
    pub code_block_indent: usize,
    /// Recognized annotation tags
    pub tags: Vec<String>,
    pub tag_colon: TagColon,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            code_block_indent: 4,
            tags: vec!["FIXME".to_string(), "NOTE".to_string(), "TODO".to_string()],
            tag_colon: TagColon::Forbidden,
        }
    }
}

/// A set of files sharing comment markers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Display name used in logs
    #[serde(default)]
    pub name: Option<String>,
    /// Ordered include/exclude globs; the last matching entry wins
    pub paths: Vec<PathEntry>,
    pub comment_markers: CommentMarkers,
    /// Rules that are not reported for this target
    #[serde(default)]
    pub allow: Vec<RuleId>,
}

impl TargetConfig {
    pub fn display_name(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("targets[{index}]"))
    }
}

/// One include or exclude glob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

impl PathEntry {
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            include: Some(pattern.into()),
            exclude: None,
        }
    }

    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            include: None,
            exclude: Some(pattern.into()),
        }
    }
}

/// Comment markers of a language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentMarkers {
    pub line: String,
    #[serde(default)]
    pub block: Option<String>,
    /// Closing marker; derived from `block` when omitted
    #[serde(default)]
    pub block_end: Option<String>,
}

impl CommentMarkers {
    pub fn line_only(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            block: None,
            block_end: None,
        }
    }

    pub fn with_block(line: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            block: Some(block.into()),
            block_end: None,
        }
    }

    /// Closing marker for block comments, if one is known
    pub fn block_terminator(&self) -> Option<String> {
        if let Some(end) = &self.block_end {
            return Some(end.clone());
        }
        let closing = match self.block.as_deref()? {
            "/*" => "*/",
            "(*" => "*)",
            "{-" => "-}",
            "<!--" => "-->",
            "%{" => "%}",
            "#=" => "=#",
            "--[[" => "]]",
            _ => return None,
        };
        Some(closing.to_string())
    }
}

impl CommentStyleConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> StyleResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            StyleError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            StyleError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> StyleResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| StyleError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Find and load the first default config file in `dir`, if any
    pub fn discover_in<P: AsRef<Path>>(dir: P) -> StyleResult<Option<Self>> {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.as_ref().join(name);
            if candidate.is_file() {
                tracing::debug!("Using configuration {}", candidate.display());
                return Self::load_from_file(candidate).map(Some);
            }
        }
        Ok(None)
    }

    /// Default configuration covering common comment syntaxes
    pub fn with_defaults() -> Self {
        let c_style = [
            "*.go", "*.c", "*.h", "*.cc", "*.cpp", "*.hpp", "*.java", "*.js", "*.ts", "*.kt",
            "*.swift", "*.scala", "*.cs", "*.dart", "*.zig",
        ];
        let hash_style = ["*.py", "*.sh", "*.rb", "*.toml", "*.yaml", "*.yml"];

        Self {
            version: "1.0".to_string(),
            paths: PathConfig::default(),
            conventions: Conventions::default(),
            targets: vec![
                TargetConfig {
                    name: Some("c-style".to_string()),
                    paths: c_style.iter().map(|p| PathEntry::include(*p)).collect(),
                    comment_markers: CommentMarkers::with_block("//", "/*"),
                    allow: Vec::new(),
                },
                TargetConfig {
                    name: Some("hash".to_string()),
                    paths: hash_style.iter().map(|p| PathEntry::include(*p)).collect(),
                    comment_markers: CommentMarkers::line_only("#"),
                    allow: Vec::new(),
                },
            ],
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> StyleResult<()> {
        if self.version != "1.0" {
            return Err(StyleError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.targets.is_empty() {
            return Err(StyleError::config("`targets` must contain at least one target"));
        }

        self.conventions.validate()?;

        for pattern in &self.paths.patterns {
            let glob = pattern.trim_start_matches('!').trim_matches('/');
            glob::Pattern::new(glob).map_err(|e| {
                StyleError::config(format!("Invalid path pattern '{pattern}': {e}"))
            })?;
        }

        for (i, target) in self.targets.iter().enumerate() {
            if target.paths.is_empty() {
                return Err(StyleError::config(format!("`targets[{i}].paths` is empty")));
            }

            for (j, entry) in target.paths.iter().enumerate() {
                let pattern = match (&entry.include, &entry.exclude) {
                    (Some(pattern), None) | (None, Some(pattern)) => pattern,
                    (Some(_), Some(_)) => {
                        return Err(StyleError::config(format!(
                            "`targets[{i}].paths[{j}]` contains both 'include' and 'exclude'"
                        )));
                    }
                    (None, None) => {
                        return Err(StyleError::config(format!(
                            "`targets[{i}].paths[{j}]` doesn't contain 'include' or 'exclude'"
                        )));
                    }
                };
                glob::Pattern::new(pattern).map_err(|e| {
                    StyleError::config(format!(
                        "Invalid glob '{pattern}' in `targets[{i}].paths[{j}]`: {e}"
                    ))
                })?;
            }

            let markers = &target.comment_markers;
            if markers.line.trim().is_empty() {
                return Err(StyleError::config(format!(
                    "`targets[{i}].comment_markers.line` is empty"
                )));
            }
            if markers.block.as_deref().is_some_and(|b| b.trim().is_empty()) {
                return Err(StyleError::config(format!(
                    "`targets[{i}].comment_markers.block` is empty"
                )));
            }
        }

        Ok(())
    }

    /// Create a fingerprint of the configuration for reports
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.version.hash(&mut hasher);
        self.paths.patterns.hash(&mut hasher);
        self.paths.ignore_file.hash(&mut hasher);
        self.conventions.hash(&mut hasher);

        for target in &self.targets {
            target.name.hash(&mut hasher);
            for entry in &target.paths {
                entry.include.hash(&mut hasher);
                entry.exclude.hash(&mut hasher);
            }
            target.comment_markers.line.hash(&mut hasher);
            target.comment_markers.block.hash(&mut hasher);
            target.comment_markers.block_end.hash(&mut hasher);

            let mut allow = target.allow.clone();
            allow.sort();
            allow.hash(&mut hasher);
        }

        format!("{:x}", hasher.finish())
    }

    /// Convert to YAML for `validate-config` output and round trips
    pub fn to_yaml(&self) -> StyleResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| StyleError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Conventions {
    pub fn validate(&self) -> StyleResult<()> {
        if self.code_block_indent == 0 {
            return Err(StyleError::config("`conventions.code_block_indent` must be at least 1"));
        }
        if self.tags.is_empty() {
            return Err(StyleError::config("`conventions.tags` must not be empty"));
        }
        for tag in &self.tags {
            if tag.is_empty() || !tag.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(StyleError::config(format!(
                    "Invalid tag '{tag}': tags must be non-empty words"
                )));
            }
        }
        Ok(())
    }
}

impl Default for CommentStyleConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: CommentStyleConfig,
}

impl ConfigBuilder {
    /// Start from the defaults
    pub fn new() -> Self {
        Self { config: CommentStyleConfig::default() }
    }

    /// Start with no targets
    pub fn empty() -> Self {
        let mut config = CommentStyleConfig::default();
        config.targets.clear();
        Self { config }
    }

    pub fn add_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.paths.patterns.push(pattern.into());
        self
    }

    pub fn ignore_file(mut self, filename: impl Into<String>) -> Self {
        self.config.paths.ignore_file = Some(filename.into());
        self
    }

    pub fn conventions(mut self, conventions: Conventions) -> Self {
        self.config.conventions = conventions;
        self
    }

    pub fn add_target(mut self, target: TargetConfig) -> Self {
        self.config.targets.push(target);
        self
    }

    pub fn build(self) -> StyleResult<CommentStyleConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
