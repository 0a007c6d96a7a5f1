//! Identity resolution and wikilink maintenance for Obsidian media notes.

pub mod backup;
pub mod config;
pub mod context;
pub mod disambiguate;
pub mod error;
pub mod frontmatter;
pub mod model;
pub mod naming;
pub mod note;
pub mod pipeline;
pub mod poster;
pub mod prompt;
pub mod provider;
pub mod rewrite;
pub mod vault;
pub mod wikilink;
