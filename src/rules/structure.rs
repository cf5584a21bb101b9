//! Rules about the shape of comments rather than their prose

use crate::domain::comments::{CommentGroup, GroupKind, Position};
use crate::domain::violations::{Diagnostic, RuleId};
use crate::rules::{GroupRule, LineContext, LineRule, Rule};

/// Block comments are not allowed at all
pub struct BlockCommentRule;

impl Rule for BlockCommentRule {
    fn id(&self) -> RuleId {
        RuleId::BlockComment
    }
}

impl GroupRule for BlockCommentRule {
    fn check(&self, group: &CommentGroup) -> Vec<Diagnostic> {
        if group.kind == GroupKind::Block {
            vec![Diagnostic::new(self.id(), group.start)]
        } else {
            Vec::new()
        }
    }
}

/// Comments must sit on their own line
pub struct TrailingCommentRule;

impl Rule for TrailingCommentRule {
    fn id(&self) -> RuleId {
        RuleId::TrailingComment
    }
}

impl GroupRule for TrailingCommentRule {
    fn check(&self, group: &CommentGroup) -> Vec<Diagnostic> {
        if group.kind == GroupKind::Trailing {
            vec![Diagnostic::new(self.id(), group.start)]
        } else {
            Vec::new()
        }
    }
}

pub struct BlockStartsEmptyRule;

impl Rule for BlockStartsEmptyRule {
    fn id(&self) -> RuleId {
        RuleId::BlockStartsEmpty
    }
}

impl GroupRule for BlockStartsEmptyRule {
    fn check(&self, group: &CommentGroup) -> Vec<Diagnostic> {
        group
            .leading_blank
            .map(|position| Diagnostic::new(self.id(), position))
            .into_iter()
            .collect()
    }
}

pub struct BlockEndsEmptyRule;

impl Rule for BlockEndsEmptyRule {
    fn id(&self) -> RuleId {
        RuleId::BlockEndsEmpty
    }
}

impl GroupRule for BlockEndsEmptyRule {
    fn check(&self, group: &CommentGroup) -> Vec<Diagnostic> {
        group
            .trailing_blank
            .map(|position| Diagnostic::new(self.id(), position))
            .into_iter()
            .collect()
    }
}

/// Text must be separated from the marker by a space
pub struct NoLeadingSpaceRule;

impl Rule for NoLeadingSpaceRule {
    fn id(&self) -> RuleId {
        RuleId::NoLeadingSpace
    }
}

impl LineRule for NoLeadingSpaceRule {
    fn check(&self, context: &LineContext<'_>) -> Vec<Diagnostic> {
        let line = context.line;
        if line.has_leading_space {
            return Vec::new();
        }
        vec![Diagnostic::new(
            self.id(),
            Position::new(line.number, line.raw_column),
        )]
    }
}
