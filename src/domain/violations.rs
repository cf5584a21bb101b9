//! Diagnostics, file-level violations and the check report
//!
//! Architecture: Rich Domain Models - Diagnostics are values produced by rules, never mutated
//! - RuleId is the closed set of rules the engine knows how to evaluate
//! - Violation binds a diagnostic to the file and source line it came from
//! - CheckReport acts as the aggregate root for a whole run

use crate::domain::comments::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Identifier of a rule in the rulebook
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    BlockComment,
    TrailingComment,
    BlockStartsEmpty,
    BlockEndsEmpty,
    NoLeadingSpace,
    MalformedTag,
    StartsWithLowercase,
    NoSectionEndingPunctuation,
    NoEndingPunctuation,
    EndsWithColon,
}

impl RuleId {
    /// Every rule, in registration order
    pub const ALL: [RuleId; 10] = [
        RuleId::BlockComment,
        RuleId::TrailingComment,
        RuleId::BlockStartsEmpty,
        RuleId::BlockEndsEmpty,
        RuleId::NoLeadingSpace,
        RuleId::MalformedTag,
        RuleId::StartsWithLowercase,
        RuleId::NoSectionEndingPunctuation,
        RuleId::NoEndingPunctuation,
        RuleId::EndsWithColon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlockComment => "block_comment",
            Self::TrailingComment => "trailing_comment",
            Self::BlockStartsEmpty => "block_starts_empty",
            Self::BlockEndsEmpty => "block_ends_empty",
            Self::NoLeadingSpace => "no_leading_space",
            Self::MalformedTag => "malformed_tag",
            Self::StartsWithLowercase => "starts_with_lowercase",
            Self::NoSectionEndingPunctuation => "no_section_ending_punctuation",
            Self::NoEndingPunctuation => "no_ending_punctuation",
            Self::EndsWithColon => "ends_with_colon",
        }
    }

    /// Default message attached to diagnostics of this rule
    pub fn message(self) -> &'static str {
        match self {
            Self::BlockComment => "Block comments aren't allowed",
            Self::TrailingComment => "Comments must be on their own line",
            Self::BlockStartsEmpty => "Comment blocks can't start with an empty line",
            Self::BlockEndsEmpty => "Comment blocks can't end with an empty line",
            Self::NoLeadingSpace => "Non-empty line comments must start with a space",
            Self::MalformedTag => "Tagged comments must follow the tag convention",
            Self::StartsWithLowercase => {
                "Letters at the start of comment sections must be capitalised"
            }
            Self::NoSectionEndingPunctuation => {
                "Sections of comment blocks must end with `.` or `:`"
            }
            Self::NoEndingPunctuation => "Comment blocks must end with `.`",
            Self::EndsWithColon => "Comment blocks can't end with a colon",
        }
    }

    /// Longer description used by `explain`
    pub fn explanation(self) -> &'static str {
        match self {
            Self::BlockComment => {
                "Block comments are reported once per comment, anchored at the opening marker. \
                 Their contents are not checked further."
            }
            Self::TrailingComment => {
                "A line comment that follows code on the same line is reported. Markers that \
                 appear inside string literals are ignored."
            }
            Self::BlockStartsEmpty => {
                "The first line of a comment block is an empty comment line, which adds \
                 nothing but noise."
            }
            Self::BlockEndsEmpty => {
                "The last line of a comment block is an empty comment line. Empty lines are \
                 only meaningful between sections."
            }
            Self::NoLeadingSpace => {
                "Text must be separated from the comment marker by a space, as in `// Text`."
            }
            Self::MalformedTag => {
                "A line starting with a tag such as TODO, FIXME or NOTE must follow the tag \
                 convention: the configured colon policy, a space after the tag, and a \
                 capital letter after the space."
            }
            Self::StartsWithLowercase => {
                "The first sentence of each section must start with a capital letter. Lines \
                 that continue a run-on sentence and indented code blocks are exempt."
            }
            Self::NoSectionEndingPunctuation => {
                "A section followed by another section must end with `.` or `:`. Sections \
                 ending in a code block are exempt."
            }
            Self::NoEndingPunctuation => {
                "The last sentence of a comment block must end with `.`. Blocks ending in a \
                 code block are exempt."
            }
            Self::EndsWithColon => {
                "A colon promises more content. The last sentence of a comment block must not \
                 end with one."
            }
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| StyleError::config(format!("Unknown rule '{s}'")))
    }
}

/// Severity of a diagnostic; the rulebook has a single tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Violation,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Violation => "violation",
        }
    }
}

/// A finding produced by a rule for one comment group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule_id: RuleId,
    pub severity: Severity,
    pub message: String,
    pub position: Position,
}

impl Diagnostic {
    /// Create a diagnostic carrying the rule's default message
    pub fn new(rule_id: RuleId, position: Position) -> Self {
        Self::with_message(rule_id, position, rule_id.message())
    }

    pub fn with_message(rule_id: RuleId, position: Position, message: impl Into<String>) -> Self {
        Self {
            rule_id,
            severity: Severity::Violation,
            message: message.into(),
            position,
        }
    }

    pub fn line(&self) -> u32 {
        self.position.line
    }

    pub fn column(&self) -> u32 {
        self.position.column
    }
}

/// A diagnostic located in a specific file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub file_path: PathBuf,
    pub rule_id: RuleId,
    pub severity: Severity,
    pub message: String,
    pub line_number: u32,
    pub column_number: u32,
    /// The source line the diagnostic points at
    pub context: Option<String>,
}

impl Violation {
    pub fn from_diagnostic(file_path: PathBuf, diagnostic: Diagnostic) -> Self {
        Self {
            file_path,
            rule_id: diagnostic.rule_id,
            severity: diagnostic.severity,
            message: diagnostic.message,
            line_number: diagnostic.position.line,
            column_number: diagnostic.position.column,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Format violation for display
    pub fn format_display(&self) -> String {
        format!(
            "{}:{}:{}: ({}) {}",
            self.file_path.display(),
            self.line_number,
            self.column_number,
            self.rule_id,
            self.message
        )
    }
}

/// A file that could not be analyzed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub file_path: PathBuf,
    pub message: String,
}

/// Summary statistics for a check report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Total number of files analyzed
    pub total_files: usize,
    /// Number of violations per rule id
    pub violations_by_rule: BTreeMap<RuleId, usize>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    pub checked_at: DateTime<Utc>,
}

impl CheckSummary {
    pub fn total_violations(&self) -> usize {
        self.violations_by_rule.values().sum()
    }
}

/// Complete result of a check run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub violations: Vec<Violation>,
    pub failures: Vec<AnalysisFailure>,
    pub summary: CheckSummary,
    pub config_fingerprint: Option<String>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            failures: Vec::new(),
            summary: CheckSummary {
                checked_at: Utc::now(),
                ..Default::default()
            },
            config_fingerprint: None,
        }
    }

    pub fn add_violation(&mut self, violation: Violation) {
        *self.summary.violations_by_rule.entry(violation.rule_id).or_insert(0) += 1;
        self.violations.push(violation);
    }

    pub fn add_failure(&mut self, file_path: PathBuf, message: impl Into<String>) {
        self.failures.push(AnalysisFailure {
            file_path,
            message: message.into(),
        });
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Violations reported by a single rule
    pub fn violations_for(&self, rule_id: RuleId) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.rule_id == rule_id)
    }

    pub fn set_files_analyzed(&mut self, count: usize) {
        self.summary.total_files = count;
    }

    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }

    /// Process exit status: 2 when a file failed, 1 on violations, 0 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            2
        } else if self.has_violations() {
            1
        } else {
            0
        }
    }

    /// Sort by file, then position, then rule registration order
    pub fn sort_violations(&mut self) {
        self.violations.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then_with(|| a.line_number.cmp(&b.line_number))
                .then_with(|| a.column_number.cmp(&b.column_number))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        self.failures.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    }
}

impl Default for CheckReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur while checking comments
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Glob or regex compilation failed
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Analysis failed for a specific file
    #[error("Analysis error in {file}: {message}")]
    Analysis { file: String, message: String },

    /// The comment producer handed over unordered or overlapping comments
    #[error("Comment at {current} is out of order after comment ending at {previous}")]
    InputOrdering { previous: Position, current: Position },

    /// The run was cancelled between files
    #[error("Check cancelled")]
    Cancelled,
}

impl StyleError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    pub fn analysis(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis {
            file: file.into(),
            message: message.into(),
        }
    }
}

/// Result type for comment-style operations
pub type StyleResult<T> = Result<T, StyleError>;
