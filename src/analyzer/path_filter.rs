//! Path filtering using .gitignore-style patterns
//!
//! Architectural Principle: Service Layer - PathFilter orchestrates path matching logic
//! - Encapsulates the rules for include/exclude pattern evaluation
//! - Prunes excluded directories while walking instead of filtering afterwards
//! - Handles .commentstyleignore file discovery and parsing
//! - TargetPaths selects the files handled by one configured target

use crate::config::PathEntry;
use crate::domain::violations::{StyleError, StyleResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default name of per-directory ignore files
pub const DEFAULT_IGNORE_FILE: &str = ".commentstyleignore";

/// Manages path filtering using .gitignore-style patterns
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Exclude patterns, with `!` patterns re-including
    patterns: Vec<FilterPattern>,
    /// Whether to process ignore files
    process_ignore_files: bool,
    /// Name of ignore files to process
    ignore_filename: String,
}

/// A single gitignore-style pattern
#[derive(Debug, Clone)]
struct FilterPattern {
    pattern: glob::Pattern,
    /// Whether this is an include pattern (starts with !)
    is_include: bool,
    /// Trailing `/`: matches directories and everything below them
    directory_only: bool,
    /// Contains or starts with `/`: matched against the whole relative path
    full_path: bool,
}

impl FilterPattern {
    fn parse(raw: &str) -> StyleResult<Self> {
        let (is_include, body) = match raw.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, raw),
        };
        Self::build(raw, body, is_include)
    }

    fn build(original: &str, body: &str, is_include: bool) -> StyleResult<Self> {
        let directory_only = body.ends_with('/');
        let trimmed = body.trim_matches('/');
        let full_path = body.starts_with('/') || trimmed.contains('/');

        let pattern = glob::Pattern::new(trimmed)
            .map_err(|e| StyleError::pattern(format!("Invalid pattern '{original}': {e}")))?;

        Ok(Self {
            pattern,
            is_include,
            directory_only,
            full_path,
        })
    }

    /// Check if the pattern matches a relative path using .gitignore-style rules
    fn matches(&self, path: &Path, is_dir: bool) -> bool {
        if self.directory_only {
            // A directory pattern covers the directory and everything inside it.
            let skip = usize::from(!is_dir);
            return path
                .ancestors()
                .skip(skip)
                .filter(|dir| !dir.as_os_str().is_empty())
                .any(|dir| self.matches_one(dir));
        }
        self.matches_one(path)
    }

    fn matches_one(&self, path: &Path) -> bool {
        if self.full_path {
            return self.pattern.matches_path(path);
        }
        path.file_name()
            .is_some_and(|name| self.pattern.matches(&name.to_string_lossy()))
    }
}

impl PathFilter {
    /// Create a new path filter with the given patterns
    pub fn new(patterns: Vec<String>, ignore_filename: Option<String>) -> StyleResult<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| FilterPattern::parse(pattern))
            .collect::<StyleResult<Vec<_>>>()?;

        Ok(Self {
            patterns,
            process_ignore_files: ignore_filename.is_some(),
            ignore_filename: ignore_filename.unwrap_or_else(|| DEFAULT_IGNORE_FILE.to_string()),
        })
    }

    /// Create a default path filter with sensible exclusions
    pub fn with_defaults() -> StyleResult<Self> {
        let defaults = crate::config::PathConfig::default();
        Self::new(defaults.patterns, defaults.ignore_file)
    }

    /// Stop consulting ignore files
    pub fn without_ignore_files(mut self) -> Self {
        self.process_ignore_files = false;
        self
    }

    /// Check if a file should be analyzed based on all patterns and ignore files
    pub fn should_analyze<P: AsRef<Path>>(&self, path: P) -> StyleResult<bool> {
        let path = path.as_ref();

        if self.is_excluded(path, path.is_dir()) {
            return Ok(false);
        }

        if self.process_ignore_files && self.is_ignored_by_files(path)? {
            return Ok(false);
        }

        Ok(true)
    }

    /// Apply configured patterns in order, like .gitignore
    fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        let mut excluded = false;
        for pattern in &self.patterns {
            if pattern.matches(relative, is_dir) {
                excluded = !pattern.is_include;
            }
        }
        excluded
    }

    /// Check if path is ignored by ignore files in any parent directory
    fn is_ignored_by_files(&self, path: &Path) -> StyleResult<bool> {
        let mut current_dir = path.parent();
        let mut is_ignored = false;

        while let Some(dir) = current_dir {
            let ignore_file = dir.join(&self.ignore_filename);

            if ignore_file.is_file() {
                let relative_path = path.strip_prefix(dir).unwrap_or(path);
                for pattern in self.load_ignore_file(&ignore_file)? {
                    if pattern.matches(relative_path, false) {
                        is_ignored = !pattern.is_include;
                    }
                }
            }

            current_dir = dir.parent();
        }

        Ok(is_ignored)
    }

    /// Load patterns from an ignore file
    fn load_ignore_file(&self, path: &Path) -> StyleResult<Vec<FilterPattern>> {
        let content = fs::read_to_string(path).map_err(|e| {
            StyleError::config(format!(
                "Failed to read ignore file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut patterns = Vec::new();

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match FilterPattern::parse(line) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => {
                    tracing::warn!("Skipping pattern in {}: {}", path.display(), e);
                }
            }
        }

        Ok(patterns)
    }

    /// Get all files that should be analyzed in a directory tree, in a stable order
    pub fn find_files<P: AsRef<Path>>(&self, root: P) -> StyleResult<Vec<PathBuf>> {
        let root = root.as_ref();
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.is_excluded(relative_to(root, entry.path()), true)
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.is_excluded(relative_to(root, path), false) {
                continue;
            }
            if self.process_ignore_files && self.is_ignored_by_files(path)? {
                continue;
            }

            files.push(entry.into_path());
        }

        Ok(files)
    }

    /// Add a pattern to the filter
    pub fn add_pattern(&mut self, pattern: &str) -> StyleResult<()> {
        self.patterns.push(FilterPattern::parse(pattern)?);
        Ok(())
    }
}

/// Ordered include/exclude globs selecting the files of one target
///
/// Files start unselected; each matching entry includes or excludes the
/// file, and the last matching entry wins.
#[derive(Debug, Clone)]
pub struct TargetPaths {
    entries: Vec<FilterPattern>,
}

impl TargetPaths {
    pub fn from_entries(entries: &[PathEntry]) -> StyleResult<Self> {
        let entries = entries
            .iter()
            .map(|entry| match (&entry.include, &entry.exclude) {
                (Some(pattern), None) => FilterPattern::build(pattern, pattern, true),
                (None, Some(pattern)) => FilterPattern::build(pattern, pattern, false),
                _ => Err(StyleError::config(
                    "Path entries need exactly one of 'include' or 'exclude'",
                )),
            })
            .collect::<StyleResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Whether the target handles `path`, given relative to the checked root
    pub fn matches(&self, path: &Path) -> bool {
        let mut selected = false;
        for entry in &self.entries {
            if entry.matches(path, false) {
                selected = entry.is_include;
            }
        }
        selected
    }
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
