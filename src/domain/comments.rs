//! Comment model shared by the tokenizer, the segmenter and the rules
//!
//! Architecture: Value Objects - Raw comments come from the scanner and never change
//! - CommentGroup owns its comments and the sections derived from them
//! - Line and Sentence carry precomputed facts so rules never re-derive heuristics

use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based source position; columns count characters
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The position `chars` characters to the right on the same line
    pub fn advance(self, chars: usize) -> Self {
        Self {
            line: self.line,
            column: self.column + chars as u32,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Line,
    Block,
}

/// One lexical comment as extracted from a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub kind: CommentKind,
    /// Comment text with the opening marker removed
    pub text: String,
    /// Position of the opening marker
    pub start: Position,
    /// Position of the last character of the comment
    pub end: Position,
    /// Width of the opening marker in characters
    pub marker_width: u32,
    /// Set when code precedes the comment on its first line
    pub follows_code: bool,
}

impl RawComment {
    /// A line comment whose marker starts at `start`
    pub fn line(text: impl Into<String>, start: Position, marker: &str) -> Self {
        let text = text.into();
        let marker_width = marker.chars().count() as u32;
        let width = marker_width + text.chars().count() as u32;
        let end = Position::new(start.line, start.column + width.saturating_sub(1));

        Self {
            kind: CommentKind::Line,
            text,
            start,
            end,
            marker_width,
            follows_code: false,
        }
    }

    /// A block comment spanning `start..=end`
    pub fn block(text: impl Into<String>, start: Position, end: Position, marker: &str) -> Self {
        Self {
            kind: CommentKind::Block,
            text: text.into(),
            start,
            end,
            marker_width: marker.chars().count() as u32,
            follows_code: false,
        }
    }

    /// Mark the comment as sharing its line with preceding code
    pub fn after_code(mut self) -> Self {
        self.follows_code = true;
        self
    }

    /// Column of the first character after the marker
    pub fn text_column(&self) -> u32 {
        self.start.column + self.marker_width
    }

    /// Whether the text is empty once whitespace is trimmed
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// Adjacent own-line line comments
    Lines,
    /// A single block comment
    Block,
    /// A single line comment following code
    Trailing,
}

/// A maximal run of adjacent line comments, or one block or trailing comment
#[derive(Debug, Clone)]
pub struct CommentGroup {
    pub kind: GroupKind,
    /// Position of the first comment's marker
    pub start: Position,
    pub comments: Vec<RawComment>,
    /// Empty for block and trailing groups
    pub sections: Vec<Section>,
    /// Marker position of a blank first line
    pub leading_blank: Option<Position>,
    /// Marker position of a blank last line, when distinct from the first
    pub trailing_blank: Option<Position>,
}

impl CommentGroup {
    /// Every non-blank line of the group, in source order
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.sections.iter().flat_map(|section| section.lines.iter())
    }

    /// The sentence that terminates the group, if the group ends in prose
    pub fn final_sentence(&self) -> Option<(&Section, &Sentence)> {
        let section = self.sections.last()?;
        if section.last_line().is_code_block {
            return None;
        }
        section.sentences.last().map(|sentence| (section, sentence))
    }
}

/// A run of non-blank comment lines inside a group
#[derive(Debug, Clone)]
pub struct Section {
    /// Never empty
    pub lines: Vec<Line>,
    /// Content of the prose lines joined with newlines
    pub text: String,
    /// Offset of each line's content in `text`; `None` for code lines
    pub line_offsets: Vec<Option<usize>>,
    pub sentences: Vec<Sentence>,
}

impl Section {
    pub fn last_line(&self) -> &Line {
        &self.lines[self.lines.len() - 1]
    }

    /// Source position of a byte offset into `text`
    pub fn position_at(&self, offset: usize) -> Option<Position> {
        let (index, base) = self
            .line_offsets
            .iter()
            .enumerate()
            .filter_map(|(index, base)| base.map(|base| (index, base)))
            .take_while(|&(_, base)| base <= offset)
            .last()?;

        let line = &self.lines[index];
        let within = offset - base;
        if within > line.content.len() {
            return None;
        }
        let chars = line.content.get(..within)?.chars().count();
        Some(line.content_position().advance(chars))
    }

    pub fn sentence_text(&self, sentence: &Sentence) -> &str {
        &self.text[sentence.start..sentence.end]
    }

    /// Position of the sentence's first character
    pub fn sentence_start(&self, sentence: &Sentence) -> Option<Position> {
        self.position_at(sentence.start)
    }

    /// Position of the sentence's last character
    pub fn sentence_end(&self, sentence: &Sentence) -> Option<Position> {
        let (offset, _) = self.sentence_text(sentence).char_indices().last()?;
        self.position_at(sentence.start + offset)
    }
}

/// One physical, non-blank comment line
#[derive(Debug, Clone)]
pub struct Line {
    /// Source line number
    pub number: u32,
    pub marker_column: u32,
    /// Text after the marker, untouched
    pub raw: String,
    pub raw_column: u32,
    /// `raw` without its conventional leading space and trailing whitespace
    pub content: String,
    pub content_column: u32,
    pub has_leading_space: bool,
    pub is_code_block: bool,
    pub tag: Option<AnnotationTag>,
}

impl Line {
    pub fn content_position(&self) -> Position {
        Position::new(self.number, self.content_column)
    }

    /// Position of a byte offset into `content`
    pub fn position_of(&self, offset: usize) -> Position {
        let chars = self
            .content
            .get(..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or_else(|| self.content.chars().count());
        self.content_position().advance(chars)
    }
}

/// Terminal punctuation of a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Period,
    Colon,
    /// `?` or `!`
    Other(char),
    None,
}

impl Terminal {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Self::Period),
            ':' => Some(Self::Colon),
            '?' | '!' => Some(Self::Other(ch)),
            _ => None,
        }
    }

    /// Whether a section may end on this punctuation
    pub fn ends_section(self) -> bool {
        matches!(self, Self::Period | Self::Colon)
    }
}

/// A sentence-like unit of a section's prose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Byte range in the section text
    pub start: usize,
    pub end: usize,
    /// Line indices within the section
    pub first_line: usize,
    pub last_line: usize,
    pub terminal: Terminal,
    pub initial: char,
    /// First sentence of the section, starting on its first line
    pub section_initial: bool,
    /// Continues across a line break that had no terminal punctuation
    pub run_on: bool,
}

impl Sentence {
    pub fn starts_lowercase(&self) -> bool {
        self.initial.is_lowercase()
    }
}

/// A leading annotation tag such as `TODO`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTag {
    pub name: String,
    pub has_colon: bool,
    pub space_after: bool,
    /// Byte offset into the line content where the tag's text begins
    pub remainder: usize,
}

impl AnnotationTag {
    /// Byte offset just past the tag and its optional colon
    pub fn marker_end(&self) -> usize {
        self.name.len() + usize::from(self.has_colon)
    }
}
