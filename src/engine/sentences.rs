//! Sentence segmentation of section prose
//!
//! Architecture: Pure Function - Lines in, joined text and sentence views out
//! - Code-block lines never contribute text and always close the open sentence
//! - A line without terminal punctuation continues the open sentence
//! - Terminal punctuation inside backtick spans or a tag marker is ignored

use crate::domain::comments::{Line, Sentence, Terminal};

/// Joined prose text of a section and the sentences found in it
#[derive(Debug, Clone, Default)]
pub struct Segmented {
    pub text: String,
    pub line_offsets: Vec<Option<usize>>,
    pub sentences: Vec<Sentence>,
}

struct OpenSentence {
    start: usize,
    first_line: usize,
    initial: char,
}

#[derive(Default)]
struct Segmenter {
    text: String,
    line_offsets: Vec<Option<usize>>,
    sentences: Vec<Sentence>,
    open: Option<OpenSentence>,
    last_prose_line: usize,
}

impl Segmenter {
    fn close(&mut self, end: usize, last_line: usize, terminal: Terminal) {
        let Some(open) = self.open.take() else {
            return;
        };

        self.sentences.push(Sentence {
            start: open.start,
            end,
            first_line: open.first_line,
            last_line,
            terminal,
            initial: open.initial,
            section_initial: self.sentences.is_empty() && open.first_line == 0,
            run_on: last_line > open.first_line,
        });
    }

    /// Close an unterminated sentence at the end of the text seen so far
    fn close_unterminated(&mut self) {
        let end = self.text.len();
        let last_line = self.last_prose_line;
        self.close(end, last_line, Terminal::None);
    }

    fn push_prose(&mut self, index: usize, line: &Line) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        let base = self.text.len();
        self.line_offsets.push(Some(base));
        self.text.push_str(&line.content);
        self.last_prose_line = index;

        let tag_end = line.tag.as_ref().map_or(0, |tag| tag.marker_end());
        let chars: Vec<(usize, char)> = line.content.char_indices().collect();
        let mut in_code_span = false;

        for (i, &(offset, ch)) in chars.iter().enumerate() {
            if ch == '`' {
                in_code_span = !in_code_span;
            }

            if self.open.is_none() {
                if ch.is_whitespace() {
                    continue;
                }
                self.open = Some(OpenSentence {
                    start: base + offset,
                    first_line: index,
                    initial: ch,
                });
            }

            if in_code_span || offset < tag_end {
                continue;
            }

            let Some(terminal) = Terminal::from_char(ch) else {
                continue;
            };
            let at_boundary = chars
                .get(i + 1)
                .map_or(true, |&(_, next)| next.is_whitespace());
            if at_boundary {
                self.close(base + offset + ch.len_utf8(), index, terminal);
            }
        }
    }
}

/// Split the lines of one section into sentences
pub fn segment(lines: &[Line]) -> Segmented {
    let mut segmenter = Segmenter::default();

    for (index, line) in lines.iter().enumerate() {
        if line.is_code_block {
            segmenter.line_offsets.push(None);
            segmenter.close_unterminated();
        } else {
            segmenter.push_prose(index, line);
        }
    }
    segmenter.close_unterminated();

    Segmented {
        text: segmenter.text,
        line_offsets: segmenter.line_offsets,
        sentences: segmenter.sentences,
    }
}
