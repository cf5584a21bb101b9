//! Rule evaluation engine
//!
//! Architecture: Domain Service - Engine turns ordered raw comments into ordered diagnostics
//! - Tokenizer builds groups, sections and lines; the segmenter derives sentences
//! - The rule set evaluates every group; the collector orders the findings
//! - Pure and synchronous: no I/O, no shared state, safe to share across threads

pub mod collector;
pub mod sentences;
pub mod tags;
pub mod tokenizer;

use crate::config::Conventions;
use crate::domain::comments::{CommentGroup, RawComment};
use crate::domain::violations::{Diagnostic, StyleResult};
use crate::rules::RuleSet;

pub use collector::DiagnosticCollector;
pub use tags::TagMatcher;
pub use tokenizer::Tokenizer;

/// Tokenizer and rule set for one set of conventions
#[derive(Debug)]
pub struct Engine {
    tokenizer: Tokenizer,
    rules: RuleSet,
}

impl Engine {
    /// Create an engine running the full rulebook
    pub fn new(conventions: &Conventions) -> StyleResult<Self> {
        Self::with_rules(conventions, RuleSet::default_rules(conventions))
    }

    pub fn with_rules(conventions: &Conventions, rules: RuleSet) -> StyleResult<Self> {
        conventions.validate()?;
        Ok(Self {
            tokenizer: Tokenizer::new(conventions)?,
            rules,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Build comment groups from the ordered comments of one file
    pub fn group(&self, comments: Vec<RawComment>) -> StyleResult<Vec<CommentGroup>> {
        self.tokenizer.group(comments)
    }

    /// Evaluate every rule over `groups` and return diagnostics in output order
    pub fn evaluate(&self, groups: &[CommentGroup]) -> Vec<Diagnostic> {
        let mut collector = DiagnosticCollector::new();
        for group in groups {
            self.rules.evaluate(group, &mut collector);
        }
        collector.into_sorted()
    }

    /// Group and evaluate in one step
    pub fn check(&self, comments: Vec<RawComment>) -> StyleResult<Vec<Diagnostic>> {
        let groups = self.group(comments)?;
        Ok(self.evaluate(&groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comments::Position;
    use crate::domain::violations::RuleId;
    use crate::rules::testing::comments;
    use rstest::rstest;

    fn engine() -> Engine {
        Engine::new(&Conventions::default()).unwrap()
    }

    fn check(texts: &[&str]) -> Vec<(RuleId, u32, u32)> {
        engine()
            .check(comments(texts))
            .unwrap()
            .into_iter()
            .map(|d| (d.rule_id, d.line(), d.column()))
            .collect()
    }

    #[rstest]
    #[case::alright(&[" This comment is alright."], vec![])]
    #[case::lowercase_then_more(
        &[" this is a test", " here is more."],
        vec![(RuleId::StartsWithLowercase, 1, 4)]
    )]
    #[case::sections(
        &[" Example:", "", " more"],
        vec![(RuleId::StartsWithLowercase, 3, 4), (RuleId::NoEndingPunctuation, 3, 7)]
    )]
    #[case::no_leading_space(
        &["TODO fix this"],
        vec![(RuleId::NoLeadingSpace, 1, 3), (RuleId::NoEndingPunctuation, 1, 15)]
    )]
    #[case::single_blank(&[""], vec![(RuleId::BlockStartsEmpty, 1, 1)])]
    #[case::both_blank_edges(
        &["", " Text.", ""],
        vec![(RuleId::BlockStartsEmpty, 1, 1), (RuleId::BlockEndsEmpty, 3, 1)]
    )]
    #[case::colon_after_sections(
        &[" First.", "", " Second:"],
        vec![(RuleId::EndsWithColon, 3, 10)]
    )]
    #[case::code_block_only(&["     code blocks don't need proper grammar"], vec![])]
    #[case::consecutive_blanks(&[" First.", "", "", " Second."], vec![])]
    fn test_scenarios(#[case] texts: &[&str], #[case] expected: Vec<(RuleId, u32, u32)>) {
        assert_eq!(check(texts), expected);
    }

    #[test]
    fn test_lowercase_section_yields_exactly_one_capitalisation_finding() {
        let found = check(&[" lowercase start.", " More text here."]);
        assert_eq!(found, vec![(RuleId::StartsWithLowercase, 1, 4)]);
    }

    #[test]
    fn test_block_comment_yields_only_block_comment() {
        let found = engine()
            .check(vec![RawComment::block(
                "no punctuation, lowercase",
                Position::new(2, 1),
                Position::new(2, 29),
                "/*",
            )])
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, RuleId::BlockComment);
        assert_eq!(found[0].position, Position::new(2, 1));
    }

    #[test]
    fn test_trailing_comment_yields_only_trailing_comment() {
        let found = engine()
            .check(vec![
                RawComment::line("no space or period", Position::new(1, 12), "//").after_code(),
            ])
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, RuleId::TrailingComment);
    }

    #[test]
    fn test_ties_break_by_registration_order() {
        // All three rules anchor on the lone `x`.
        assert_eq!(
            check(&["x"]),
            vec![
                (RuleId::NoLeadingSpace, 1, 3),
                (RuleId::StartsWithLowercase, 1, 3),
                (RuleId::NoEndingPunctuation, 1, 3),
            ]
        );
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let engine = engine();
        let groups = engine
            .group(comments(&["", "lowercase", "", " TODO: fix", ""]))
            .unwrap();

        let first = engine.evaluate(&groups);
        let second = engine.evaluate(&groups);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_allowed_rules_are_not_reported() {
        let conventions = Conventions::default();
        let rules = RuleSet::default_rules(&conventions).without(&[RuleId::NoEndingPunctuation]);
        let engine = Engine::with_rules(&conventions, rules).unwrap();

        let found = engine.check(comments(&[" No period"])).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_invalid_conventions_are_rejected() {
        let conventions = Conventions {
            code_block_indent: 0,
            ..Default::default()
        };
        assert!(Engine::new(&conventions).is_err());
    }
}
