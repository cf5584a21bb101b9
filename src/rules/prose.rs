//! Rules about the prose inside line comment groups
//!
//! Architecture: Strategy Pattern - Prose rules read precomputed line and sentence facts
//! - Code-block lines are never seen as prose
//! - Run-on continuation lines are never sentence starts

use crate::config::TagColon;
use crate::domain::comments::{CommentGroup, Terminal};
use crate::domain::violations::{Diagnostic, RuleId};
use crate::rules::{
    GroupRule, LineContext, LineRule, Rule, SectionContext, SectionRule, SentenceContext,
    SentenceRule,
};

/// Tag lines must follow the tag convention
pub struct MalformedTagRule {
    policy: TagColon,
}

impl MalformedTagRule {
    pub fn new(policy: TagColon) -> Self {
        Self { policy }
    }
}

impl Rule for MalformedTagRule {
    fn id(&self) -> RuleId {
        RuleId::MalformedTag
    }
}

impl LineRule for MalformedTagRule {
    fn check(&self, context: &LineContext<'_>) -> Vec<Diagnostic> {
        let line = context.line;
        let Some(tag) = &line.tag else {
            return Vec::new();
        };

        let mut found = Vec::new();
        let after_name = line.position_of(tag.name.len());
        match (self.policy, tag.has_colon) {
            (TagColon::Forbidden, true) => found.push(Diagnostic::with_message(
                self.id(),
                after_name,
                "Tags must not be followed by a colon",
            )),
            (TagColon::Required, false) => found.push(Diagnostic::with_message(
                self.id(),
                after_name,
                "Tags must be followed by a colon",
            )),
            _ => {}
        }

        if !tag.space_after {
            found.push(Diagnostic::with_message(
                self.id(),
                line.position_of(tag.marker_end()),
                "Tagged comments must start with a space",
            ));
        } else if line
            .content
            .get(tag.remainder..)
            .and_then(|rest| rest.chars().next())
            .is_some_and(char::is_lowercase)
        {
            found.push(Diagnostic::with_message(
                self.id(),
                line.position_of(tag.remainder),
                "Letters at the start of tagged comments must be capitalised",
            ));
        }

        found
    }
}

/// The first sentence of a section must be capitalised
pub struct StartsWithLowercaseRule;

impl Rule for StartsWithLowercaseRule {
    fn id(&self) -> RuleId {
        RuleId::StartsWithLowercase
    }
}

impl SentenceRule for StartsWithLowercaseRule {
    fn check(&self, context: &SentenceContext<'_>) -> Vec<Diagnostic> {
        let sentence = context.sentence;
        if !sentence.section_initial || !sentence.starts_lowercase() {
            return Vec::new();
        }
        context
            .section
            .sentence_start(sentence)
            .map(|position| Diagnostic::new(self.id(), position))
            .into_iter()
            .collect()
    }
}

/// Sections followed by another section end with `.` or `:`
pub struct NoSectionEndingPunctuationRule;

impl Rule for NoSectionEndingPunctuationRule {
    fn id(&self) -> RuleId {
        RuleId::NoSectionEndingPunctuation
    }
}

impl SectionRule for NoSectionEndingPunctuationRule {
    fn check(&self, context: &SectionContext<'_>) -> Vec<Diagnostic> {
        let section = context.section;
        if context.is_last() || section.last_line().is_code_block {
            return Vec::new();
        }

        section
            .sentences
            .last()
            .filter(|sentence| !sentence.terminal.ends_section())
            .and_then(|sentence| section.sentence_end(sentence))
            .map(|position| Diagnostic::new(self.id(), position))
            .into_iter()
            .collect()
    }
}

/// The final sentence of a group ends with `.`
pub struct NoEndingPunctuationRule;

impl Rule for NoEndingPunctuationRule {
    fn id(&self) -> RuleId {
        RuleId::NoEndingPunctuation
    }
}

impl GroupRule for NoEndingPunctuationRule {
    fn check(&self, group: &CommentGroup) -> Vec<Diagnostic> {
        group
            .final_sentence()
            .filter(|(_, sentence)| !sentence.terminal.ends_section())
            .and_then(|(section, sentence)| section.sentence_end(sentence))
            .map(|position| Diagnostic::new(self.id(), position))
            .into_iter()
            .collect()
    }
}

/// The final sentence of a group does not end with `:`
pub struct EndsWithColonRule;

impl Rule for EndsWithColonRule {
    fn id(&self) -> RuleId {
        RuleId::EndsWithColon
    }
}

impl GroupRule for EndsWithColonRule {
    fn check(&self, group: &CommentGroup) -> Vec<Diagnostic> {
        group
            .final_sentence()
            .filter(|(_, sentence)| sentence.terminal == Terminal::Colon)
            .and_then(|(section, sentence)| section.sentence_end(sentence))
            .map(|position| Diagnostic::new(self.id(), position))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::run;
    use crate::rules::Check;
    use rstest::rstest;

    fn lowercase() -> Check {
        Check::Sentence(Box::new(StartsWithLowercaseRule))
    }

    fn tag(policy: TagColon) -> Check {
        Check::Line(Box::new(MalformedTagRule::new(policy)))
    }

    fn section_end() -> Check {
        Check::Section(Box::new(NoSectionEndingPunctuationRule))
    }

    fn group_end() -> Check {
        Check::Group(Box::new(NoEndingPunctuationRule))
    }

    fn colon_end() -> Check {
        Check::Group(Box::new(EndsWithColonRule))
    }

    #[rstest]
    #[case::first_line(&[" this is a test", " here is more."], vec![(1, 4)])]
    #[case::run_on(
        &[" Run-on sentences don't need to start", " the second line with a capital."],
        vec![]
    )]
    #[case::second_section(
        &[" Different sections need capitals.", "", " this section should."],
        vec![(3, 4)]
    )]
    #[case::code_span(&[" `code` gets around this."], vec![])]
    #[case::code_block(&["     code blocks don't need grammar"], vec![])]
    #[case::later_sentence(&[" First sentence. second sentence."], vec![])]
    #[case::after_code_line(&[" Example", "     x := 1", " continues here."], vec![])]
    #[case::missing_space(&["lowercase without space."], vec![(1, 3)])]
    fn test_starts_with_lowercase(#[case] texts: &[&str], #[case] expected: Vec<(u32, u32)>) {
        let found: Vec<(u32, u32)> = run(lowercase(), texts)
            .into_iter()
            .map(|(rule, line, column)| {
                assert_eq!(rule, RuleId::StartsWithLowercase);
                (line, column)
            })
            .collect();
        assert_eq!(found, expected);
    }

    #[rstest]
    #[case::lowercase_after_tag(TagColon::Forbidden, " TODO this should be capitalised.", Some((9, "Letters at the start of tagged comments must be capitalised")))]
    #[case::forbidden_colon(TagColon::Forbidden, " TODO: This shouldn't have a colon.", Some((8, "Tags must not be followed by a colon")))]
    #[case::required_colon(TagColon::Required, " TODO Fix.", Some((8, "Tags must be followed by a colon")))]
    #[case::required_present(TagColon::Required, " FIXME: Fix.", None)]
    #[case::optional(TagColon::Optional, " NOTE: Either way.", None)]
    #[case::no_space(TagColon::Optional, " NOTE:Cramped.", Some((9, "Tagged comments must start with a space")))]
    #[case::bare(TagColon::Forbidden, " TODO", Some((8, "Tagged comments must start with a space")))]
    #[case::well_formed(TagColon::Forbidden, " TODO Write more tests.", None)]
    #[case::not_a_tag(TagColon::Forbidden, " TODOs live in the tracker.", None)]
    fn test_malformed_tag(
        #[case] policy: TagColon,
        #[case] text: &str,
        #[case] expected: Option<(u32, &str)>,
    ) {
        let groups = crate::engine::tokenizer::Tokenizer::new(&crate::config::Conventions {
            tag_colon: policy,
            ..Default::default()
        })
        .unwrap()
        .group(crate::rules::testing::comments(&[text]))
        .unwrap();

        let rule = MalformedTagRule::new(policy);
        let section = &groups[0].sections[0];
        let found: Vec<(u32, String)> = rule
            .check(&LineContext {
                group: &groups[0],
                section,
                line: &section.lines[0],
            })
            .into_iter()
            .map(|d| (d.column(), d.message))
            .collect();

        let expected: Vec<(u32, String)> = expected
            .into_iter()
            .map(|(column, message)| (column, message.to_string()))
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_malformed_tag_reports_each_problem() {
        let found = run(tag(TagColon::Forbidden), &[" TODO:lowercase"]);
        assert_eq!(
            found,
            vec![(RuleId::MalformedTag, 1, 8), (RuleId::MalformedTag, 1, 9)]
        );
    }

    #[test]
    fn test_tags_are_ignored_in_code_blocks() {
        assert!(run(tag(TagColon::Forbidden), &["     TODO: this is code"]).is_empty());
    }

    #[test]
    fn test_section_ending_punctuation() {
        assert_eq!(
            run(
                section_end(),
                &[" This section should end with a period", "", " This is alright."]
            ),
            vec![(RuleId::NoSectionEndingPunctuation, 1, 40)]
        );
        assert_eq!(
            run(section_end(), &[" Why?", "", " Because."]),
            vec![(RuleId::NoSectionEndingPunctuation, 1, 7)]
        );
        assert!(run(section_end(), &[" The following:", "", " Is fine."]).is_empty());
        assert!(run(section_end(), &[" Example", "     x := 1", "", " Done."]).is_empty());
        // The final section is the group rules' concern.
        assert!(run(section_end(), &[" First.", "", " no punctuation"]).is_empty());
    }

    #[test]
    fn test_group_ending_punctuation() {
        assert_eq!(
            run(group_end(), &[" This comment should end with a period"]),
            vec![(RuleId::NoEndingPunctuation, 1, 40)]
        );
        assert_eq!(
            run(group_end(), &[" Why?"]),
            vec![(RuleId::NoEndingPunctuation, 1, 7)]
        );
        assert!(run(
            group_end(),
            &[" This run-on sentence only", " needs a period at the end."]
        )
        .is_empty());
        assert!(run(group_end(), &[" Example:", "     x := 1"]).is_empty());
        assert!(run(group_end(), &[" Ends with a colon:"]).is_empty());
    }

    #[test]
    fn test_ends_with_colon() {
        assert_eq!(
            run(colon_end(), &[" But comment blocks can't end with a colon:"]),
            vec![(RuleId::EndsWithColon, 1, 45)]
        );
        assert_eq!(
            run(colon_end(), &[" First.", "", " Second:"]),
            vec![(RuleId::EndsWithColon, 3, 10)]
        );
        assert!(run(colon_end(), &[" The following is alright:", "", " And so is this."]).is_empty());
    }
}
