//! Main analysis orchestrator for comment-style
//!
//! CDD Principle: Domain Services - Analyzer orchestrates per-file checking workflows
//! - Coordinates discovery, target selection, scanning and rule evaluation
//! - Provides a clean interface for checking single files or directory trees
//! - Handles parallel processing, cancellation and error recovery gracefully

pub mod path_filter;
pub mod scanner;

use crate::config::CommentStyleConfig;
use crate::domain::violations::{CheckReport, RuleId, StyleError, StyleResult, Violation};
use crate::engine::Engine;
use crate::rules::RuleSet;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub use path_filter::{PathFilter, TargetPaths};
pub use scanner::{CommentExtractor, MarkerScanner};

/// Main analyzer that orchestrates the entire check
pub struct Analyzer {
    /// Configuration for this analysis
    config: CommentStyleConfig,
    /// Path filter applied during discovery
    path_filter: PathFilter,
    /// Compiled targets, in configuration order
    targets: Vec<Target>,
}

/// A configured target compiled for checking
struct Target {
    name: String,
    paths: TargetPaths,
    scanner: Box<dyn CommentExtractor>,
    engine: Engine,
}

/// Shared flag that stops an analysis between files
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to use parallel processing
    pub parallel: bool,
    /// Maximum number of files to analyze
    pub max_files: Option<usize>,
    /// Whether to stop at the first file that cannot be analyzed
    pub fail_fast: bool,
    /// Additional paths to exclude
    pub exclude_patterns: Vec<String>,
    /// Whether to ignore .commentstyleignore files
    pub ignore_ignore_files: bool,
    /// Checked before each file
    pub cancel: Option<CancellationFlag>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_files: None,
            fail_fast: false,
            exclude_patterns: Vec::new(),
            ignore_ignore_files: false,
            cancel: None,
        }
    }
}

/// A file found during discovery
#[derive(Debug, Clone)]
struct Discovered {
    /// Path as reported
    path: PathBuf,
    /// Index of the handling target
    target: usize,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: CommentStyleConfig) -> StyleResult<Self> {
        config.validate()?;

        let mut targets = Vec::with_capacity(config.targets.len());
        for (index, target) in config.targets.iter().enumerate() {
            let name = target.display_name(index);
            let rules = RuleSet::default_rules(&config.conventions).without(&target.allow);
            let engine = Engine::with_rules(&config.conventions, rules).map_err(|e| {
                StyleError::config(format!("Failed to build rules for target '{name}': {e}"))
            })?;

            tracing::debug!(
                "Target '{}' checks {} rules with line marker '{}'",
                name,
                engine.rules().len(),
                target.comment_markers.line
            );

            targets.push(Target {
                paths: TargetPaths::from_entries(&target.paths)?,
                scanner: Box::new(MarkerScanner::new(&target.comment_markers)),
                engine,
                name,
            });
        }

        let ignore_file = if config.paths.ignore_file.as_deref() == Some("") {
            None
        } else {
            config.paths.ignore_file.clone()
        };

        let path_filter = PathFilter::new(config.paths.patterns.clone(), ignore_file)
            .map_err(|e| StyleError::config(format!("Failed to create path filter: {e}")))?;

        Ok(Self {
            config,
            path_filter,
            targets,
        })
    }

    /// Create an analyzer with default configuration
    pub fn with_defaults() -> StyleResult<Self> {
        Self::new(CommentStyleConfig::default())
    }

    pub fn config(&self) -> &CommentStyleConfig {
        &self.config
    }

    fn target_for(&self, relative: &Path) -> Option<usize> {
        self.targets.iter().position(|target| target.paths.matches(relative))
    }

    /// Name of the target that would handle `path`, if any
    pub fn target_name<P: AsRef<Path>>(&self, path: P) -> Option<&str> {
        self.target_for(path.as_ref())
            .map(|index| self.targets[index].name.as_str())
    }

    /// Check source text as if it were the file at `path`
    ///
    /// Returns no violations when no target handles `path`.
    pub fn analyze_source<P: AsRef<Path>>(
        &self,
        path: P,
        source: &str,
    ) -> StyleResult<Vec<Violation>> {
        let path = path.as_ref();
        match self.target_for(path) {
            Some(index) => self.check_source(&self.targets[index], path, source),
            None => Ok(Vec::new()),
        }
    }

    /// Analyze a single file and return violations
    pub fn analyze_file<P: AsRef<Path>>(&self, file_path: P) -> StyleResult<Vec<Violation>> {
        let file_path = file_path.as_ref();

        let Some(index) = self.target_for(file_path) else {
            tracing::debug!("No target handles '{}'", file_path.display());
            return Ok(Vec::new());
        };

        let source = read_source(file_path)?;
        self.check_source(&self.targets[index], file_path, &source)
    }

    fn check_source(
        &self,
        target: &Target,
        file_path: &Path,
        source: &str,
    ) -> StyleResult<Vec<Violation>> {
        let comments = target.scanner.extract(source);
        let diagnostics = target.engine.check(comments).map_err(|e| {
            StyleError::analysis(file_path.display().to_string(), e.to_string())
        })?;

        let lines: Vec<&str> = source.lines().collect();
        let violations = diagnostics
            .into_iter()
            .map(|diagnostic| {
                let context = lines
                    .get(diagnostic.line().saturating_sub(1) as usize)
                    .map(|line| line.trim_end().to_string());
                let violation = Violation::from_diagnostic(file_path.to_path_buf(), diagnostic);
                match context {
                    Some(context) => violation.with_context(context),
                    None => violation,
                }
            })
            .collect();

        Ok(violations)
    }

    /// Analyze multiple files and return a complete report
    pub fn analyze_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> StyleResult<CheckReport> {
        let start_time = Instant::now();
        let mut report = CheckReport::new();

        let filter = self.discovery_filter(options)?;
        let mut files = Vec::new();

        for path in paths {
            let path = path.as_ref();

            if path.is_file() {
                if filter.should_analyze(path)? {
                    files.push((path.to_path_buf(), path.to_path_buf()));
                }
            } else if path.is_dir() {
                for file in filter.find_files(path)? {
                    let relative = file.strip_prefix(path).unwrap_or(&file).to_path_buf();
                    files.push((file, relative));
                }
            } else {
                tracing::warn!("Path '{}' does not exist", path.display());
                report.add_failure(path.to_path_buf(), "No such file or directory");
            }
        }

        // Only files handled by a target count as checked
        let mut files: Vec<Discovered> = files
            .into_iter()
            .filter_map(|(path, relative)| {
                self.target_for(&relative)
                    .map(|target| Discovered { path, target })
            })
            .collect();

        if let Some(max_files) = options.max_files {
            files.truncate(max_files);
        }

        let total_files = files.len();

        if options.parallel && files.len() > 1 {
            let results: Vec<_> = files
                .par_iter()
                .map(|file| (file, self.analyze_discovered(file, options)))
                .collect();
            Self::record_results(results.into_iter(), &mut report, options)?;
        } else {
            let results = files
                .iter()
                .map(|file| (file, self.analyze_discovered(file, options)));
            Self::record_results(results, &mut report, options)?;
        }

        report.set_files_analyzed(total_files);
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.config.fingerprint());
        report.sort_violations();

        Ok(report)
    }

    /// Fold per-file results into the report, stopping early where required
    fn record_results<'a>(
        results: impl Iterator<Item = (&'a Discovered, StyleResult<Vec<Violation>>)>,
        report: &mut CheckReport,
        options: &AnalysisOptions,
    ) -> StyleResult<()> {
        for (file, result) in results {
            match result {
                Ok(violations) => {
                    for violation in violations {
                        report.add_violation(violation);
                    }
                }
                Err(StyleError::Cancelled) => return Err(StyleError::Cancelled),
                Err(e) if options.fail_fast => return Err(e),
                Err(e) => {
                    // Log error and continue
                    tracing::warn!("Failed to analyze {}: {}", file.path.display(), e);
                    report.add_failure(file.path.clone(), e.to_string());
                }
            }
        }
        Ok(())
    }

    fn analyze_discovered(
        &self,
        file: &Discovered,
        options: &AnalysisOptions,
    ) -> StyleResult<Vec<Violation>> {
        if options.cancel.as_ref().is_some_and(CancellationFlag::is_cancelled) {
            return Err(StyleError::Cancelled);
        }

        let target = &self.targets[file.target];
        tracing::debug!("Checking '{}' as {}", file.path.display(), target.name);

        let source = read_source(&file.path)?;
        self.check_source(target, &file.path, &source)
    }

    fn discovery_filter(&self, options: &AnalysisOptions) -> StyleResult<PathFilter> {
        let mut filter = self.path_filter.clone();
        for pattern in &options.exclude_patterns {
            filter.add_pattern(pattern)?;
        }
        if options.ignore_ignore_files {
            filter = filter.without_ignore_files();
        }
        Ok(filter)
    }

    /// Analyze a directory tree and return a report
    pub fn analyze_directory<P: AsRef<Path>>(
        &self,
        root: P,
        options: &AnalysisOptions,
    ) -> StyleResult<CheckReport> {
        self.analyze_paths(&[root.as_ref()], options)
    }

    /// Get configuration fingerprint for reports
    pub fn config_fingerprint(&self) -> String {
        self.config.fingerprint()
    }

    /// Get statistics about the configured targets and rules
    pub fn rule_stats(&self) -> RuleStats {
        let mut stats = RuleStats {
            targets: self.targets.len(),
            ..Default::default()
        };

        for target in &self.targets {
            let enabled = target.engine.rules().len();
            stats.enabled_rules += enabled;
            stats.allowed_rules += RuleId::ALL.len() - enabled;
        }

        stats
    }
}

/// Statistics about configured rules, summed over targets
#[derive(Debug, Default)]
pub struct RuleStats {
    pub targets: usize,
    pub enabled_rules: usize,
    pub allowed_rules: usize,
}

impl RuleStats {
    pub fn total_rules(&self) -> usize {
        self.enabled_rules + self.allowed_rules
    }
}

fn read_source(path: &Path) -> StyleResult<String> {
    fs::read_to_string(path).map_err(|e| {
        StyleError::analysis(path.display().to_string(), format!("Failed to read file: {e}"))
    })
}
