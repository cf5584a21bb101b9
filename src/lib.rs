//! comment-style - Opinionated comment style checking
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - The rule engine is pure and knows nothing about files
//! - Scanning, discovery and reporting sit around it as thin adapters
//! - CommentValidator offers the workflows the CLI and embedders need

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod engine;
pub mod report;
pub mod rules;

// Re-export main types for convenient access
pub use domain::comments::{
    AnnotationTag, CommentGroup, CommentKind, GroupKind, Line, Position, RawComment, Section,
    Sentence, Terminal,
};
pub use domain::violations::{
    AnalysisFailure, CheckReport, CheckSummary, Diagnostic, RuleId, Severity, StyleError,
    StyleResult, Violation,
};

pub use config::{
    CommentMarkers, CommentStyleConfig, ConfigBuilder, Conventions, PathEntry, TagColon,
    TargetConfig,
};

pub use analyzer::{AnalysisOptions, Analyzer, CancellationFlag, RuleStats};

pub use engine::Engine;

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main validator providing high-level checking operations
#[derive(Clone)]
pub struct CommentValidator {
    analyzer: Arc<Analyzer>,
    report_formatter: ReportFormatter,
}

impl CommentValidator {
    /// Create a new validator with the given configuration
    pub fn new_with_config(config: CommentStyleConfig) -> StyleResult<Self> {
        Ok(Self {
            analyzer: Arc::new(Analyzer::new(config)?),
            report_formatter: ReportFormatter::default(),
        })
    }

    /// Create a validator with default configuration
    pub fn new() -> StyleResult<Self> {
        Self::new_with_config(CommentStyleConfig::default())
    }

    /// Create a validator loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> StyleResult<Self> {
        Self::new_with_config(CommentStyleConfig::load_from_file(path)?)
    }

    /// Use the first well-known configuration file in `dir`, or the defaults
    pub fn discover<P: AsRef<Path>>(dir: P) -> StyleResult<Self> {
        let config = CommentStyleConfig::discover_in(dir)?.unwrap_or_default();
        Self::new_with_config(config)
    }

    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Check files and directories on a blocking worker thread
    ///
    /// Cancel through `options.cancel`; the run stops before the next file.
    pub async fn check_paths<P: AsRef<Path>>(
        &self,
        paths: Vec<P>,
        options: &AnalysisOptions,
    ) -> StyleResult<CheckReport> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let analyzer = Arc::clone(&self.analyzer);
        let options = options.clone();

        tokio::task::spawn_blocking(move || analyzer.analyze_paths(&paths, &options))
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    StyleError::Cancelled
                } else {
                    StyleError::analysis("<worker>", e.to_string())
                }
            })?
    }

    /// Check a single file
    pub fn check_file<P: AsRef<Path>>(&self, file_path: P) -> StyleResult<CheckReport> {
        let file_path = file_path.as_ref();
        let violations = self.analyzer.analyze_file(file_path)?;

        let mut report = CheckReport::new();
        for violation in violations {
            report.add_violation(violation);
        }
        let handled = self.analyzer.target_name(file_path).is_some();
        report.set_files_analyzed(usize::from(handled));
        report.set_config_fingerprint(self.analyzer.config_fingerprint());

        Ok(report)
    }

    /// Check source text as if it lived at `path`
    pub fn check_source<P: AsRef<Path>>(&self, path: P, source: &str) -> StyleResult<CheckReport> {
        let path = path.as_ref();
        let mut report = CheckReport::new();
        for violation in self.analyzer.analyze_source(path, source)? {
            report.add_violation(violation);
        }
        report.set_files_analyzed(usize::from(self.analyzer.target_name(path).is_some()));
        Ok(report)
    }

    /// Check an entire directory tree
    pub fn check_directory<P: AsRef<Path>>(
        &self,
        root: P,
        options: &AnalysisOptions,
    ) -> StyleResult<CheckReport> {
        self.analyzer.analyze_directory(root, options)
    }

    /// Format a check report for output
    pub fn format_report(&self, report: &CheckReport, format: OutputFormat) -> StyleResult<String> {
        self.report_formatter.format_report(report, format)
    }

    pub fn rule_stats(&self) -> RuleStats {
        self.analyzer.rule_stats()
    }
}

/// Check files with the default configuration
pub async fn check_files<P: AsRef<Path>>(files: Vec<P>) -> StyleResult<CheckReport> {
    CommentValidator::new()?
        .check_paths(files, &AnalysisOptions::default())
        .await
}

/// Check a directory with the default configuration
pub fn check_directory<P: AsRef<Path>>(directory: P) -> StyleResult<CheckReport> {
    CommentValidator::new()?.check_directory(directory, &AnalysisOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GO_SOURCE: &str = "package main\n\n// this needs a capital.\nfunc main() {}\n";

    #[test]
    fn test_validator_creation() {
        let validator = CommentValidator::new().unwrap();
        let stats = validator.rule_stats();

        assert!(stats.targets > 0);
        assert_eq!(stats.enabled_rules, stats.targets * RuleId::ALL.len());
    }

    #[tokio::test]
    async fn test_check_paths() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("main.go");
        fs::write(&test_file, GO_SOURCE).unwrap();

        let validator = CommentValidator::new().unwrap();
        let report = validator
            .check_paths(vec![&test_file], &AnalysisOptions::default())
            .await
            .unwrap();

        assert_eq!(report.summary.total_files, 1);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule_id, RuleId::StartsWithLowercase);
        assert_eq!(report.violations[0].line_number, 3);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_check_paths_blocking_helper() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("ok.go"), "// Fine.\npackage ok\n").unwrap();

        let report = tokio_test::block_on(check_files(vec![temp_dir.path()])).unwrap();
        assert_eq!(report.summary.total_files, 1);
        assert!(!report.has_violations());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_single_file_check() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("main.go");
        fs::write(&test_file, GO_SOURCE).unwrap();

        let validator = CommentValidator::new().unwrap();
        let report = validator.check_file(&test_file).unwrap();

        assert!(report.has_violations());
        assert_eq!(report.summary.total_files, 1);
        assert!(report.config_fingerprint.is_some());
    }

    #[test]
    fn test_unhandled_file_counts_as_unchecked() {
        let temp_dir = TempDir::new().unwrap();
        let notes = temp_dir.path().join("notes.txt");
        fs::write(&notes, "// not a comment language").unwrap();

        let report = CommentValidator::new().unwrap().check_file(&notes).unwrap();
        assert_eq!(report.summary.total_files, 0);
        assert!(!report.has_violations());
    }

    #[test]
    fn test_check_source() {
        let validator = CommentValidator::new().unwrap();
        let report = validator
            .check_source("script.py", "x = 1  # Trailing.\n")
            .unwrap();

        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule_id, RuleId::TrailingComment);
        assert_eq!(report.violations[0].column_number, 8);
    }

    #[test]
    fn test_directory_check() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg/a.go"), GO_SOURCE).unwrap();
        fs::write(root.join("pkg/b.go"), "// Clean.\npackage pkg\n").unwrap();

        let report = check_directory(root).unwrap();
        assert_eq!(report.summary.total_files, 2);
        assert_eq!(report.violations.len(), 1);
    }

    #[test]
    fn test_discover_uses_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigBuilder::empty()
            .add_target(TargetConfig {
                name: Some("go".to_string()),
                paths: vec![PathEntry::include("*.go")],
                comment_markers: CommentMarkers::line_only("//"),
                allow: vec![RuleId::StartsWithLowercase],
            })
            .build()
            .unwrap();
        fs::write(
            temp_dir.path().join("comment_style.yaml"),
            config.to_yaml().unwrap(),
        )
        .unwrap();

        let validator = CommentValidator::discover(temp_dir.path()).unwrap();
        let report = validator.check_source("main.go", GO_SOURCE).unwrap();
        assert!(!report.has_violations());
        assert_eq!(validator.rule_stats().allowed_rules, 1);

        let explicit =
            CommentValidator::from_config_file(temp_dir.path().join("comment_style.yaml")).unwrap();
        assert_eq!(explicit.rule_stats().allowed_rules, 1);
    }

    #[test]
    fn test_report_formatting() {
        let validator = CommentValidator::new()
            .unwrap()
            .with_report_formatter(ReportFormatter::new(ReportOptions {
                use_colors: false,
                ..Default::default()
            }));
        let report = validator.check_source("main.go", GO_SOURCE).unwrap();

        let human = validator.format_report(&report, OutputFormat::Human).unwrap();
        assert!(human.contains("main.go:3:4: (starts_with_lowercase)"));

        let json = validator.format_report(&report, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["violations"].is_array());
    }
}
