//! Source scanner producing raw comments from file text
//!
//! Architecture: Anti-Corruption Layer - Translates source text into RawComments
//! - Marker-driven and language agnostic; leading indentation is ignored
//! - Block comments run to their closing marker or, if none is known, to the end of the line
//! - Line markers after code are trailing comments unless they sit inside a string literal

use crate::config::CommentMarkers;
use crate::domain::comments::{Position, RawComment};

/// Extracts the comments of one file in source order
pub trait CommentExtractor: Send + Sync {
    fn extract(&self, source: &str) -> Vec<RawComment>;
}

/// Scanner driven by a target's comment markers
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    line: String,
    block: Option<String>,
    block_end: Option<String>,
}

struct OpenBlock {
    start: Position,
    text: String,
}

impl MarkerScanner {
    pub fn new(markers: &CommentMarkers) -> Self {
        Self {
            line: markers.line.clone(),
            block: markers.block.clone(),
            block_end: markers.block_terminator(),
        }
    }

    /// Continue `open` from byte `from` of `line`; returns the comment once it closes
    fn close_block(
        &self,
        open: &mut OpenBlock,
        line_number: u32,
        line: &str,
        from: usize,
    ) -> Option<(RawComment, usize)> {
        let rest = &line[from..];
        let marker = self.block.as_deref().unwrap_or_default();

        let Some(terminator) = self.block_end.as_deref() else {
            // Unknown pair: the block ends with its line.
            open.text.push_str(rest);
            let end = Position::new(line_number, char_count(line)).max(open.start);
            let text = std::mem::take(&mut open.text);
            return Some((RawComment::block(text, open.start, end, marker), line.len()));
        };

        let Some(found) = rest.find(terminator) else {
            open.text.push_str(rest);
            return None;
        };
        open.text.push_str(&rest[..found]);

        let after = from + found + terminator.len();
        let end = Position::new(line_number, char_column(line, after) - 1);
        let text = std::mem::take(&mut open.text);
        Some((RawComment::block(text, open.start, end, marker), after))
    }

    /// First line marker in `line[from..]` that is not inside a string literal
    fn trailing_comment(&self, line_number: u32, line: &str, from: usize) -> Option<RawComment> {
        let code = &line[from..];
        if code.trim().is_empty() {
            return None;
        }

        code.match_indices(self.line.as_str())
            .map(|(index, _)| from + index)
            .find(|&index| !is_likely_in_str(&line[from..], index - from))
            .map(|index| {
                let text = &line[index + self.line.len()..];
                let start = Position::new(line_number, char_column(line, index));
                RawComment::line(text, start, &self.line).after_code()
            })
    }
}

impl CommentExtractor for MarkerScanner {
    fn extract(&self, source: &str) -> Vec<RawComment> {
        let mut comments = Vec::new();
        let mut open: Option<OpenBlock> = None;
        let mut last = (0, "");

        for (index, line) in source.lines().enumerate() {
            let line_number = index as u32 + 1;
            last = (line_number, line);

            // Interpreter directives are not comments.
            if line_number == 1 && line.starts_with("#!") {
                continue;
            }

            let mut from = 0;

            if let Some(block) = open.as_mut() {
                match self.close_block(block, line_number, line, 0) {
                    Some((comment, after)) => {
                        comments.push(comment);
                        open = None;
                        from = after;
                    }
                    None => {
                        block.text.push('\n');
                        continue;
                    }
                }
            } else {
                let indent = line.len() - line.trim_start().len();
                let trimmed = &line[indent..];
                let start = Position::new(line_number, char_column(line, indent));

                if let Some(marker) = self.block.as_deref().filter(|m| trimmed.starts_with(m)) {
                    let mut block = OpenBlock {
                        start,
                        text: String::new(),
                    };
                    match self.close_block(&mut block, line_number, line, indent + marker.len()) {
                        Some((comment, after)) => {
                            comments.push(comment);
                            from = after;
                        }
                        None => {
                            block.text.push('\n');
                            open = Some(block);
                            continue;
                        }
                    }
                } else if let Some(text) = trimmed.strip_prefix(self.line.as_str()) {
                    comments.push(RawComment::line(text, start, &self.line));
                    continue;
                }
            }

            if let Some(comment) = self.trailing_comment(line_number, line, from) {
                comments.push(comment);
            }
        }

        if let Some(block) = open {
            // Unterminated: the block runs to the end of the file.
            let marker = self.block.as_deref().unwrap_or_default();
            let (line_number, line) = last;
            let end = Position::new(line_number, char_count(line).max(1)).max(block.start);
            let text = block.text.trim_end_matches('\n').to_string();
            comments.push(RawComment::block(text, block.start, end, marker));
        }

        comments
    }
}

fn char_count(line: &str) -> u32 {
    line.chars().count() as u32
}

/// 1-based column of the character at byte offset `index`
fn char_column(line: &str, index: usize) -> u32 {
    line.get(..index)
        .map_or(index, |prefix| prefix.chars().count()) as u32
        + 1
}

/// Whether byte offset `index` of `line` is likely inside a string literal
///
/// Tracks `'`, `"` and `` ` `` delimiters; a backslash only escapes while
/// inside a string.
pub fn is_likely_in_str(line: &str, index: usize) -> bool {
    let Some(prefix) = line.get(..index) else {
        return false;
    };

    let mut delimiter: Option<char> = None;
    let mut escaped = false;

    for ch in prefix.chars() {
        if matches!(ch, '\'' | '"' | '`') {
            match delimiter {
                Some(open) if open == ch && !escaped => delimiter = None,
                Some(_) => {}
                None => delimiter = Some(ch),
            }
        }
        escaped = delimiter.is_some() && ch == '\\' && !escaped;
    }

    delimiter.is_some()
}
