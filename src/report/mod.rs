//! Report generation with multiple output formats
//!
//! Architecture: Anti-Corruption Layer - Formatters translate check reports to external formats
//! - CheckReport (domain) is rendered for terminals, tools and CI annotations
//! - Each format keeps its own escaping rules
//! - Failures are reported alongside violations so nothing is silently dropped

use crate::domain::violations::{
    AnalysisFailure, CheckReport, RuleId, StyleError, StyleResult, Violation,
};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Supported output formats for check reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `path:line:col: (rule) message` line per violation
    #[default]
    Human,
    /// JSON document for programmatic consumption
    Json,
    /// GitHub Actions workflow commands
    GitHub,
    /// SARIF 2.1.0 for code scanning tools
    Sarif,
}

impl OutputFormat {
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "github", "sarif"]
    }
}

impl FromStr for OutputFormat {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "github" => Ok(Self::GitHub),
            "sarif" => Ok(Self::Sarif),
            other => Err(StyleError::config(format!(
                "Unknown output format '{other}', expected one of: {}",
                Self::all_formats().join(", ")
            ))),
        }
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Colored output for the human format
    pub use_colors: bool,
    /// Print the offending source line under each violation
    pub show_context: bool,
    /// Maximum number of violations to include
    pub max_violations: Option<usize>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_context: true,
            max_violations: None,
        }
    }
}

/// Renders check reports in the supported formats
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

#[derive(Clone, Copy)]
enum Paint {
    Location,
    Rule,
    Failure,
    Clean,
    Heading,
    Dim,
}

impl ReportFormatter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a check report in the specified format
    pub fn format_report(&self, report: &CheckReport, format: OutputFormat) -> StyleResult<String> {
        let violations = self.limit_violations(&report.violations);

        match format {
            OutputFormat::Human => Ok(self.format_human(report, &violations)),
            OutputFormat::Json => self.format_json(report, &violations),
            OutputFormat::GitHub => Ok(self.format_github(report, &violations)),
            OutputFormat::Sarif => self.format_sarif(report, &violations),
        }
    }

    fn limit_violations<'a>(&self, violations: &'a [Violation]) -> Vec<&'a Violation> {
        let limit = self.options.max_violations.unwrap_or(usize::MAX);
        violations.iter().take(limit).collect()
    }

    fn format_human(&self, report: &CheckReport, violations: &[&Violation]) -> String {
        let mut output = String::new();

        for violation in violations {
            let location = format!(
                "{}:{}:{}:",
                violation.file_path.display(),
                violation.line_number,
                violation.column_number
            );
            output.push_str(&format!(
                "{} {} {}\n",
                self.paint(&location, Paint::Location),
                self.paint(&format!("({})", violation.rule_id), Paint::Rule),
                violation.message
            ));

            if self.options.show_context {
                if let Some(context) = &violation.context {
                    output.push_str(&self.paint(&format!("    | {context}"), Paint::Dim));
                    output.push('\n');
                }
            }
        }

        let hidden = report.violations.len() - violations.len();
        if hidden > 0 {
            output.push_str(&format!("... {hidden} more violations not shown\n"));
        }

        for failure in &report.failures {
            output.push_str(&format!(
                "{} {}\n",
                self.paint(&format!("{}:", failure.file_path.display()), Paint::Location),
                self.paint(&format!("error: {}", failure.message), Paint::Failure)
            ));
        }

        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&self.format_summary(report));
        output
    }

    fn format_summary(&self, report: &CheckReport) -> String {
        let summary = &report.summary;
        let seconds = summary.execution_time_ms as f64 / 1000.0;
        let files = plural(summary.total_files, "file", "files");

        if !report.has_violations() && !report.has_failures() {
            return format!(
                "{} in {files} ({seconds:.1}s)\n",
                self.paint("No comment style violations", Paint::Clean)
            );
        }

        let mut parts = vec![self.paint(
            &plural(summary.total_violations(), "violation", "violations"),
            Paint::Heading,
        )];
        if report.has_failures() {
            parts.push(self.paint(
                &plural(report.failures.len(), "failure", "failures"),
                Paint::Failure,
            ));
        }

        format!("{} in {files} ({seconds:.1}s)\n", parts.join(", "))
    }

    fn format_json(&self, report: &CheckReport, violations: &[&Violation]) -> StyleResult<String> {
        let json_violations: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                serde_json::json!({
                    "rule_id": v.rule_id,
                    "severity": v.severity.as_str(),
                    "file_path": v.file_path.display().to_string(),
                    "line_number": v.line_number,
                    "column_number": v.column_number,
                    "message": v.message,
                    "context": v.context,
                })
            })
            .collect();

        let json_report = serde_json::json!({
            "violations": json_violations,
            "failures": report.failures.iter().map(failure_json).collect::<Vec<_>>(),
            "summary": {
                "total_files": report.summary.total_files,
                "total_violations": report.summary.total_violations(),
                "violations_by_rule": report.summary.violations_by_rule,
                "execution_time_ms": report.summary.execution_time_ms,
                "checked_at": report.summary.checked_at.to_rfc3339(),
            },
            "config_fingerprint": report.config_fingerprint,
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| StyleError::config(format!("JSON serialization failed: {e}")))
    }

    fn format_github(&self, report: &CheckReport, violations: &[&Violation]) -> String {
        let mut output = String::new();

        for violation in violations {
            output.push_str(&format!(
                "::error file={},line={},col={},title={}::{}\n",
                escape_github_property(&violation.file_path.display().to_string()),
                violation.line_number,
                violation.column_number,
                escape_github_property(violation.rule_id.as_str()),
                escape_github_data(&violation.message)
            ));
        }

        for failure in &report.failures {
            output.push_str(&format!(
                "::error file={},title=analysis-failure::{}\n",
                escape_github_property(&failure.file_path.display().to_string()),
                escape_github_data(&failure.message)
            ));
        }

        output
    }

    fn format_sarif(&self, report: &CheckReport, violations: &[&Violation]) -> StyleResult<String> {
        let rules: Vec<JsonValue> = RuleId::ALL
            .iter()
            .map(|id| {
                serde_json::json!({
                    "id": id.as_str(),
                    "shortDescription": { "text": id.message() },
                    "fullDescription": { "text": id.explanation() },
                })
            })
            .collect();

        let results: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                let mut region = serde_json::json!({
                    "startLine": v.line_number,
                    "startColumn": v.column_number,
                });
                if let Some(context) = &v.context {
                    region["snippet"] = serde_json::json!({ "text": context });
                }

                serde_json::json!({
                    "ruleId": v.rule_id.as_str(),
                    "ruleIndex": v.rule_id as usize,
                    "level": "error",
                    "message": { "text": v.message },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": { "uri": sarif_uri(&v.file_path) },
                            "region": region,
                        }
                    }]
                })
            })
            .collect();

        let notifications: Vec<JsonValue> = report
            .failures
            .iter()
            .map(|failure| {
                serde_json::json!({
                    "level": "error",
                    "message": { "text": failure.message },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": { "uri": sarif_uri(&failure.file_path) }
                        }
                    }]
                })
            })
            .collect();

        let sarif_report = serde_json::json!({
            "version": "2.1.0",
            "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                        "rules": rules,
                    }
                },
                "invocations": [{
                    "executionSuccessful": !report.has_failures(),
                    "toolExecutionNotifications": notifications,
                }],
                "results": results,
            }]
        });

        serde_json::to_string_pretty(&sarif_report)
            .map_err(|e| StyleError::config(format!("SARIF serialization failed: {e}")))
    }

    #[cfg(feature = "colors")]
    fn paint(&self, text: &str, paint: Paint) -> String {
        use colored::Colorize;

        if !self.options.use_colors {
            return text.to_string();
        }
        match paint {
            Paint::Location => text.bold().to_string(),
            Paint::Rule => text.yellow().to_string(),
            Paint::Failure => text.red().to_string(),
            Paint::Clean => text.green().to_string(),
            Paint::Heading => text.red().bold().to_string(),
            Paint::Dim => text.dimmed().to_string(),
        }
    }

    #[cfg(not(feature = "colors"))]
    fn paint(&self, text: &str, _paint: Paint) -> String {
        text.to_string()
    }
}

fn failure_json(failure: &AnalysisFailure) -> JsonValue {
    serde_json::json!({
        "file_path": failure.file_path.display().to_string(),
        "message": failure.message,
    })
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

/// SARIF artifact URIs use forward slashes
fn sarif_uri(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Escape the message part of a GitHub workflow command
fn escape_github_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Escape a `key=value` property of a GitHub workflow command
fn escape_github_property(s: &str) -> String {
    escape_github_data(s).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comments::Position;
    use crate::domain::violations::Diagnostic;
    use std::path::PathBuf;

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        })
    }

    fn create_test_report() -> CheckReport {
        let mut report = CheckReport::new();

        report.add_violation(
            Violation::from_diagnostic(
                PathBuf::from("cmd/main.go"),
                Diagnostic::new(RuleId::NoEndingPunctuation, Position::new(12, 40)),
            )
            .with_context("// This comment should end with a period"),
        );
        report.add_violation(Violation::from_diagnostic(
            PathBuf::from("cmd/main.go"),
            Diagnostic::new(RuleId::NoLeadingSpace, Position::new(20, 3)),
        ));

        report.set_files_analyzed(3);
        report.set_execution_time(1200);
        report
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("GitHub".parse::<OutputFormat>().unwrap(), OutputFormat::GitHub);
        assert!("junit".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_human_format() -> StyleResult<()> {
        let output = plain().format_report(&create_test_report(), OutputFormat::Human)?;

        assert!(output
            .contains("cmd/main.go:12:40: (no_ending_punctuation) Comment blocks must end with `.`"));
        assert!(output.contains("    | // This comment should end with a period"));
        assert!(output.contains("cmd/main.go:20:3: (no_leading_space) "));
        assert!(output.contains("2 violations in 3 files (1.2s)"));
        Ok(())
    }

    #[test]
    fn test_human_format_matches_violation_display() -> StyleResult<()> {
        let report = create_test_report();
        let output = plain().format_report(&report, OutputFormat::Human)?;

        for violation in &report.violations {
            assert!(output.contains(&violation.format_display()));
        }
        Ok(())
    }

    #[test]
    fn test_human_format_without_context() -> StyleResult<()> {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            show_context: false,
            max_violations: None,
        });
        let output = formatter.format_report(&create_test_report(), OutputFormat::Human)?;
        assert!(!output.contains("    | "));
        Ok(())
    }

    #[test]
    fn test_clean_report() -> StyleResult<()> {
        let mut report = CheckReport::new();
        report.set_files_analyzed(1);

        let output = plain().format_report(&report, OutputFormat::Human)?;
        assert!(output.starts_with("No comment style violations in 1 file"));
        Ok(())
    }

    #[test]
    fn test_failures_are_reported() -> StyleResult<()> {
        let mut report = CheckReport::new();
        report.add_failure(PathBuf::from("broken.go"), "stream did not contain valid UTF-8");

        let human = plain().format_report(&report, OutputFormat::Human)?;
        assert!(human.contains("broken.go: error: stream did not contain valid UTF-8"));
        assert!(human.contains("0 violations, 1 failure"));

        let github = plain().format_report(&report, OutputFormat::GitHub)?;
        assert!(github.contains("::error file=broken.go,title=analysis-failure::"));

        let json: JsonValue = serde_json::from_str(&plain().format_report(&report, OutputFormat::Json)?)
            .map_err(|e| StyleError::config(e.to_string()))?;
        assert_eq!(json["failures"][0]["file_path"], "broken.go");
        Ok(())
    }

    #[test]
    fn test_json_format() {
        let output = plain()
            .format_report(&create_test_report(), OutputFormat::Json)
            .unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["violations"].as_array().unwrap().len(), 2);
        assert_eq!(json["violations"][0]["rule_id"], "no_ending_punctuation");
        assert_eq!(json["violations"][0]["line_number"], 12);
        assert_eq!(json["violations"][0]["column_number"], 40);
        assert_eq!(json["summary"]["total_files"], 3);
        assert_eq!(json["summary"]["total_violations"], 2);
        assert_eq!(json["summary"]["violations_by_rule"]["no_leading_space"], 1);
    }

    #[test]
    fn test_github_format() {
        let output = plain()
            .format_report(&create_test_report(), OutputFormat::GitHub)
            .unwrap();

        assert!(output.contains(
            "::error file=cmd/main.go,line=12,col=40,title=no_ending_punctuation::"
        ));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_github_escaping() {
        assert_eq!(escape_github_data("50%\nnext"), "50%25%0Anext");
        assert_eq!(escape_github_property("a,b:c"), "a%2Cb%3Ac");
    }

    #[test]
    fn test_sarif_format() {
        let output = plain()
            .format_report(&create_test_report(), OutputFormat::Sarif)
            .unwrap();

        let sarif: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(sarif["version"], "2.1.0");

        let run = &sarif["runs"][0];
        assert_eq!(
            run["tool"]["driver"]["rules"].as_array().unwrap().len(),
            RuleId::ALL.len()
        );
        assert_eq!(run["results"][0]["ruleId"], "no_ending_punctuation");
        assert_eq!(
            run["results"][0]["locations"][0]["physicalLocation"]["region"]["startLine"],
            12
        );
        assert_eq!(run["invocations"][0]["executionSuccessful"], true);
    }

    #[test]
    fn test_max_violations() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            max_violations: Some(1),
            ..Default::default()
        });
        let report = create_test_report();

        let json: JsonValue =
            serde_json::from_str(&formatter.format_report(&report, OutputFormat::Json).unwrap())
                .unwrap();
        assert_eq!(json["violations"].as_array().unwrap().len(), 1);
        // The summary still counts everything.
        assert_eq!(json["summary"]["total_violations"], 2);

        let human = formatter.format_report(&report, OutputFormat::Human).unwrap();
        assert!(human.contains("... 1 more violations not shown"));
    }
}
