//! Domain layer for comment-style
//!
//! CDD Principle: Domain Model - Pure data for comments and the diagnostics raised against them
//! - Independent of file systems, configuration formats and terminals
//! - Expresses the vocabulary of groups, sections, lines, sentences and tags

pub mod comments;
pub mod violations;

pub use comments::*;
pub use violations::*;
