//! Annotation tag recognition
//!
//! Architecture: Value Objects - A tag match records the exact surface form
//! - The colon and the following space are captured, never normalized
//! - Policy decisions are left to the malformed_tag rule

use crate::domain::comments::AnnotationTag;
use crate::domain::violations::{StyleError, StyleResult};
use regex::Regex;

/// Recognizes tags such as `TODO` at the start of a line's content
#[derive(Debug, Clone)]
pub struct TagMatcher {
    regex: Regex,
}

impl TagMatcher {
    pub fn new(tags: &[String]) -> StyleResult<Self> {
        if tags.is_empty() {
            return Err(StyleError::config("At least one annotation tag is required"));
        }

        // Longest first so that overlapping tags prefer the full word.
        let mut sorted: Vec<&String> = tags.iter().collect();
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternatives: Vec<String> = sorted.iter().map(|tag| regex::escape(tag)).collect();

        let pattern = format!(r"^(?:{})\b", alternatives.join("|"));
        let regex = Regex::new(&pattern)
            .map_err(|e| StyleError::pattern(format!("Invalid tag pattern '{pattern}': {e}")))?;

        Ok(Self { regex })
    }

    /// Match a tag at the start of `content`
    pub fn match_line(&self, content: &str) -> Option<AnnotationTag> {
        let found = self.regex.find(content)?;
        let rest = &content[found.end()..];

        let has_colon = rest.starts_with(':');
        let after = if has_colon { &rest[1..] } else { rest };
        let space_after = after.starts_with(' ');

        let remainder = found.end() + usize::from(has_colon) + usize::from(space_after);

        Some(AnnotationTag {
            name: found.as_str().to_string(),
            has_colon,
            space_after,
            remainder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> TagMatcher {
        let tags = ["FIXME", "NOTE", "TODO"].map(String::from);
        TagMatcher::new(&tags).unwrap()
    }

    #[test]
    fn test_plain_tag() {
        let tag = matcher().match_line("TODO Fix this.").unwrap();
        assert_eq!(tag.name, "TODO");
        assert!(!tag.has_colon);
        assert!(tag.space_after);
        assert_eq!(tag.remainder, 5);
        assert_eq!(tag.marker_end(), 4);
    }

    #[test]
    fn test_tag_with_colon() {
        let tag = matcher().match_line("NOTE: Read this.").unwrap();
        assert!(tag.has_colon);
        assert!(tag.space_after);
        assert_eq!(tag.marker_end(), 5);
        assert_eq!(&"NOTE: Read this."[tag.remainder..], "Read this.");
    }

    #[test]
    fn test_tag_without_space() {
        let tag = matcher().match_line("FIXME:now").unwrap();
        assert!(tag.has_colon);
        assert!(!tag.space_after);

        let bare = matcher().match_line("TODO").unwrap();
        assert!(!bare.space_after);
        assert_eq!(bare.remainder, 4);
    }

    #[test]
    fn test_tags_match_whole_words_at_start() {
        let matcher = matcher();
        assert!(matcher.match_line("TODOs are tracked elsewhere.").is_none());
        assert!(matcher.match_line("NOTEWORTHY things.").is_none());
        assert!(matcher.match_line("See TODO below.").is_none());
        assert!(matcher.match_line("todo lowercase.").is_none());
    }

    #[test]
    fn test_custom_tags_are_escaped() {
        let matcher = TagMatcher::new(&["XXX".to_string(), "HACK".to_string()]).unwrap();
        assert_eq!(matcher.match_line("HACK Around it.").unwrap().name, "HACK");
        assert!(matcher.match_line("TODO Not configured.").is_none());
    }

    #[test]
    fn test_empty_tag_list_is_rejected() {
        assert!(TagMatcher::new(&[]).is_err());
    }
}
