//! Comment tokenizer: raw comments into groups, sections and lines
//!
//! Architecture: Factory - Builds the comment model that rules evaluate
//! - Validates that the producer handed over ordered, non-overlapping comments
//! - Merges adjacent own-line line comments into one group
//! - Splits line groups into sections on blank lines and precomputes line facts

use crate::config::Conventions;
use crate::domain::comments::{
    CommentGroup, CommentKind, GroupKind, Line, Position, RawComment, Section,
};
use crate::domain::violations::{StyleError, StyleResult};
use crate::engine::sentences::segment;
use crate::engine::tags::TagMatcher;

#[derive(Debug, Clone)]
pub struct Tokenizer {
    code_block_indent: String,
    tags: TagMatcher,
}

impl Tokenizer {
    pub fn new(conventions: &Conventions) -> StyleResult<Self> {
        Ok(Self {
            code_block_indent: " ".repeat(conventions.code_block_indent),
            tags: TagMatcher::new(&conventions.tags)?,
        })
    }

    /// Partition the ordered comments of one file into groups
    pub fn group(&self, comments: Vec<RawComment>) -> StyleResult<Vec<CommentGroup>> {
        check_ordering(&comments)?;

        let mut groups = Vec::new();
        let mut run: Vec<RawComment> = Vec::new();

        for comment in comments {
            let joins_run = comment.kind == CommentKind::Line
                && !comment.follows_code
                && run
                    .last()
                    .is_some_and(|previous| previous.end.line + 1 == comment.start.line);

            if !joins_run && !run.is_empty() {
                groups.push(self.line_group(std::mem::take(&mut run)));
            }

            match (comment.kind, comment.follows_code) {
                (CommentKind::Block, _) => groups.push(singleton(GroupKind::Block, comment)),
                (CommentKind::Line, true) => groups.push(singleton(GroupKind::Trailing, comment)),
                (CommentKind::Line, false) => run.push(comment),
            }
        }

        if !run.is_empty() {
            groups.push(self.line_group(run));
        }

        Ok(groups)
    }

    fn line_group(&self, comments: Vec<RawComment>) -> CommentGroup {
        let start = comments[0].start;
        let leading_blank = comments.first().filter(|c| c.is_blank()).map(|c| c.start);
        let trailing_blank = if comments.len() > 1 {
            comments.last().filter(|c| c.is_blank()).map(|c| c.start)
        } else {
            None
        };

        let mut sections = Vec::new();
        let mut lines = Vec::new();
        for comment in &comments {
            if comment.is_blank() {
                if !lines.is_empty() {
                    sections.push(build_section(std::mem::take(&mut lines)));
                }
            } else {
                lines.push(self.line(comment));
            }
        }
        if !lines.is_empty() {
            sections.push(build_section(lines));
        }

        CommentGroup {
            kind: GroupKind::Lines,
            start,
            comments,
            sections,
            leading_blank,
            trailing_blank,
        }
    }

    fn line(&self, comment: &RawComment) -> Line {
        let raw = comment.text.clone();
        let has_leading_space = raw.starts_with(' ');
        let body = if has_leading_space { &raw[1..] } else { raw.as_str() };

        let is_code_block = has_leading_space
            && (body.starts_with('\t') || body.starts_with(&self.code_block_indent));
        let content = body.trim_end().to_string();
        let tag = if is_code_block || !has_leading_space {
            None
        } else {
            self.tags.match_line(&content)
        };

        let raw_column = comment.text_column();
        Line {
            number: comment.start.line,
            marker_column: comment.start.column,
            content_column: raw_column + u32::from(has_leading_space),
            raw_column,
            raw,
            content,
            has_leading_space,
            is_code_block,
            tag,
        }
    }
}

fn build_section(lines: Vec<Line>) -> Section {
    let segmented = segment(&lines);
    Section {
        lines,
        text: segmented.text,
        line_offsets: segmented.line_offsets,
        sentences: segmented.sentences,
    }
}

fn singleton(kind: GroupKind, comment: RawComment) -> CommentGroup {
    CommentGroup {
        kind,
        start: comment.start,
        comments: vec![comment],
        sections: Vec::new(),
        leading_blank: None,
        trailing_blank: None,
    }
}

fn check_ordering(comments: &[RawComment]) -> StyleResult<()> {
    let mut previous_end: Option<Position> = None;

    for comment in comments {
        if comment.end < comment.start {
            return Err(StyleError::InputOrdering {
                previous: comment.start,
                current: comment.end,
            });
        }
        if let Some(previous) = previous_end {
            if comment.start <= previous {
                return Err(StyleError::InputOrdering {
                    previous,
                    current: comment.start,
                });
            }
        }
        previous_end = Some(comment.end);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(&Conventions::default()).unwrap()
    }

    fn lines(texts: &[&str]) -> Vec<RawComment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| RawComment::line(*text, Position::new(i as u32 + 1, 1), "//"))
            .collect()
    }

    #[test]
    fn test_adjacent_line_comments_form_one_group() {
        let groups = tokenizer()
            .group(lines(&[" this is a test", " here is more."]))
            .unwrap();

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.kind, GroupKind::Lines);
        assert_eq!(group.sections.len(), 1);
        assert_eq!(group.sections[0].lines.len(), 2);
        assert_eq!(group.start, Position::new(1, 1));
    }

    #[test]
    fn test_blank_lines_split_sections_and_are_not_lines() {
        let groups = tokenizer().group(lines(&[" Example:", "", " more"])).unwrap();

        let group = &groups[0];
        assert_eq!(group.sections.len(), 2);
        assert_eq!(group.lines().count(), 2);
        assert_eq!(group.comments.len(), 3);
        assert!(group.leading_blank.is_none());
        assert!(group.trailing_blank.is_none());
    }

    #[test]
    fn test_leading_and_trailing_blanks_are_recorded() {
        let groups = tokenizer().group(lines(&["", " Text.", "  "])).unwrap();
        assert_eq!(groups[0].leading_blank, Some(Position::new(1, 1)));
        assert_eq!(groups[0].trailing_blank, Some(Position::new(3, 1)));

        let single = tokenizer().group(lines(&[""])).unwrap();
        assert_eq!(single[0].leading_blank, Some(Position::new(1, 1)));
        assert!(single[0].trailing_blank.is_none());
        assert!(single[0].sections.is_empty());
    }

    #[test]
    fn test_gap_between_comments_starts_new_group() {
        let comments = vec![
            RawComment::line(" First.", Position::new(1, 1), "//"),
            RawComment::line(" Second.", Position::new(3, 1), "//"),
        ];
        let groups = tokenizer().group(comments).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_block_and_trailing_comments_are_singletons() {
        let comments = vec![
            RawComment::line(" Own line.", Position::new(1, 1), "//"),
            RawComment::block(" Block. ", Position::new(2, 1), Position::new(2, 12), "/*"),
            RawComment::line(" Own line.", Position::new(3, 1), "//"),
            RawComment::line(" Trailing.", Position::new(4, 12), "//").after_code(),
            RawComment::line(" Own line.", Position::new(5, 1), "//"),
        ];
        let groups = tokenizer().group(comments.clone()).unwrap();

        let kinds: Vec<_> = groups.iter().map(|g| g.kind).collect();
        assert_eq!(
            kinds,
            vec![
                GroupKind::Lines,
                GroupKind::Block,
                GroupKind::Lines,
                GroupKind::Trailing,
                GroupKind::Lines
            ]
        );
        assert!(groups[1].sections.is_empty());
        assert!(groups[3].sections.is_empty());

        // Groups partition the input in order.
        let flattened: Vec<RawComment> =
            groups.into_iter().flat_map(|g| g.comments).collect();
        assert_eq!(flattened, comments);
    }

    #[test]
    fn test_line_facts_are_precomputed() {
        let groups = tokenizer()
            .group(lines(&["TODO fix", "     let x = 1;", "\tnot code", " TODO: Later.  "]))
            .unwrap();
        let all: Vec<&Line> = groups[0].lines().collect();

        assert!(!all[0].has_leading_space);
        assert_eq!(all[0].content, "TODO fix");
        assert!(all[0].tag.is_none());

        assert!(all[1].is_code_block);
        assert_eq!(all[1].content, "    let x = 1;");

        assert!(!all[2].is_code_block);
        assert!(!all[2].has_leading_space);

        assert_eq!(all[3].content, "TODO: Later.");
        assert_eq!(all[3].content_column, 4);
        assert_eq!(all[3].raw_column, 3);
        assert!(all[3].tag.as_ref().is_some_and(|tag| tag.has_colon));
    }

    #[test]
    fn test_tab_after_space_is_code() {
        let groups = tokenizer().group(lines(&[" \tx := 1"])).unwrap();
        assert!(groups[0].sections[0].lines[0].is_code_block);
    }

    #[test]
    fn test_custom_code_block_indent() {
        let conventions = Conventions {
            code_block_indent: 2,
            ..Default::default()
        };
        let groups = Tokenizer::new(&conventions)
            .unwrap()
            .group(lines(&["   x = 1"]))
            .unwrap();
        assert!(groups[0].sections[0].lines[0].is_code_block);
    }

    #[test]
    fn test_overlapping_input_is_rejected() {
        let comments = vec![
            RawComment::line(" First.", Position::new(2, 1), "//"),
            RawComment::line(" Earlier.", Position::new(1, 1), "//"),
        ];
        let err = tokenizer().group(comments).unwrap_err();
        assert!(matches!(err, StyleError::InputOrdering { .. }));

        let same_line = vec![
            RawComment::line(" First.", Position::new(1, 1), "//"),
            RawComment::line(" Again.", Position::new(1, 5), "//"),
        ];
        assert!(tokenizer().group(same_line).is_err());
    }

    #[test]
    fn test_inverted_comment_is_rejected() {
        let mut comment = RawComment::line(" Text.", Position::new(3, 1), "//");
        comment.end = Position::new(2, 1);
        assert!(tokenizer().group(vec![comment]).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenizer().group(Vec::new()).unwrap().is_empty());
    }
}
