//! Rule set evaluated against comment groups
//!
//! Architecture: Strategy Pattern - Each rule is an independent, pure predicate
//! - A rule declares its scope at registration through the `Check` variant
//! - The rule set routes groups, sections, lines or sentences to each rule
//! - Ordering of the resulting diagnostics belongs to the collector

pub mod prose;
pub mod structure;

use crate::config::Conventions;
use crate::domain::comments::{CommentGroup, Line, Section, Sentence};
use crate::domain::violations::{Diagnostic, RuleId};
use crate::engine::collector::DiagnosticCollector;

/// Common behaviour of every rule
pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;
}

/// A rule evaluated once per comment group
pub trait GroupRule: Rule {
    fn check(&self, group: &CommentGroup) -> Vec<Diagnostic>;
}

/// A rule evaluated once per section of a line group
pub trait SectionRule: Rule {
    fn check(&self, context: &SectionContext<'_>) -> Vec<Diagnostic>;
}

/// A rule evaluated once per comment line
pub trait LineRule: Rule {
    fn check(&self, context: &LineContext<'_>) -> Vec<Diagnostic>;
}

/// A rule evaluated once per sentence
pub trait SentenceRule: Rule {
    fn check(&self, context: &SentenceContext<'_>) -> Vec<Diagnostic>;
}

pub struct SectionContext<'a> {
    pub group: &'a CommentGroup,
    pub section: &'a Section,
    pub index: usize,
}

impl SectionContext<'_> {
    /// Whether this is the group's final section
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.group.sections.len()
    }
}

pub struct LineContext<'a> {
    pub group: &'a CommentGroup,
    pub section: &'a Section,
    pub line: &'a Line,
}

pub struct SentenceContext<'a> {
    pub group: &'a CommentGroup,
    pub section: &'a Section,
    pub sentence: &'a Sentence,
}

/// Granularity a rule operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Group,
    Section,
    Line,
    Sentence,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Section => "section",
            Self::Line => "line",
            Self::Sentence => "sentence",
        }
    }
}

/// A registered rule together with its scope
pub enum Check {
    Group(Box<dyn GroupRule>),
    Section(Box<dyn SectionRule>),
    Line(Box<dyn LineRule>),
    Sentence(Box<dyn SentenceRule>),
}

impl Check {
    pub fn id(&self) -> RuleId {
        match self {
            Self::Group(rule) => rule.id(),
            Self::Section(rule) => rule.id(),
            Self::Line(rule) => rule.id(),
            Self::Sentence(rule) => rule.id(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::Group(_) => Scope::Group,
            Self::Section(_) => Scope::Section,
            Self::Line(_) => Scope::Line,
            Self::Sentence(_) => Scope::Sentence,
        }
    }

    fn run(&self, group: &CommentGroup) -> Vec<Diagnostic> {
        match self {
            Self::Group(rule) => rule.check(group),
            Self::Section(rule) => group
                .sections
                .iter()
                .enumerate()
                .flat_map(|(index, section)| {
                    rule.check(&SectionContext {
                        group,
                        section,
                        index,
                    })
                })
                .collect(),
            Self::Line(rule) => group
                .sections
                .iter()
                .flat_map(|section| {
                    section
                        .lines
                        .iter()
                        .flat_map(move |line| rule.check(&LineContext { group, section, line }))
                })
                .collect(),
            Self::Sentence(rule) => group
                .sections
                .iter()
                .flat_map(|section| {
                    section.sentences.iter().flat_map(move |sentence| {
                        rule.check(&SentenceContext {
                            group,
                            section,
                            sentence,
                        })
                    })
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Check::{:?}({})", self.scope(), self.id())
    }
}

/// Ordered collection of rules; registration order breaks position ties
#[derive(Debug, Default)]
pub struct RuleSet {
    checks: Vec<Check>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The full rulebook in its canonical order
    pub fn default_rules(conventions: &Conventions) -> Self {
        use prose::*;
        use structure::*;

        let mut rules = Self::empty();
        rules.register(Check::Group(Box::new(BlockCommentRule)));
        rules.register(Check::Group(Box::new(TrailingCommentRule)));
        rules.register(Check::Group(Box::new(BlockStartsEmptyRule)));
        rules.register(Check::Group(Box::new(BlockEndsEmptyRule)));
        rules.register(Check::Line(Box::new(NoLeadingSpaceRule)));
        rules.register(Check::Line(Box::new(MalformedTagRule::new(conventions.tag_colon))));
        rules.register(Check::Sentence(Box::new(StartsWithLowercaseRule)));
        rules.register(Check::Section(Box::new(NoSectionEndingPunctuationRule)));
        rules.register(Check::Group(Box::new(NoEndingPunctuationRule)));
        rules.register(Check::Group(Box::new(EndsWithColonRule)));
        rules
    }

    pub fn register(&mut self, check: Check) {
        self.checks.push(check);
    }

    /// Drop the rules listed in `allowed`, keeping the order of the rest
    pub fn without(mut self, allowed: &[RuleId]) -> Self {
        self.checks.retain(|check| !allowed.contains(&check.id()));
        self
    }

    pub fn ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.checks.iter().map(Check::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Evaluate every rule against one group
    pub fn evaluate(&self, group: &CommentGroup, collector: &mut DiagnosticCollector) {
        for (order, check) in self.checks.iter().enumerate() {
            collector.extend(order, check.run(group));
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::domain::comments::{Position, RawComment};
    use crate::engine::tokenizer::Tokenizer;

    /// Comments after a `//` marker in column 1, one per source line
    pub fn comments(texts: &[&str]) -> Vec<RawComment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| RawComment::line(*text, Position::new(i as u32 + 1, 1), "//"))
            .collect()
    }

    /// Run a single check over the groups built from `texts`
    pub fn run(check: Check, texts: &[&str]) -> Vec<(RuleId, u32, u32)> {
        let groups = Tokenizer::new(&Conventions::default())
            .unwrap()
            .group(comments(texts))
            .unwrap();

        let mut rules = RuleSet::empty();
        rules.register(check);

        let mut collector = DiagnosticCollector::new();
        for group in &groups {
            rules.evaluate(group, &mut collector);
        }
        collector
            .into_sorted()
            .into_iter()
            .map(|d| (d.rule_id, d.line(), d.column()))
            .collect()
    }
}
