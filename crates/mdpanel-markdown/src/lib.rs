//! Markdown to HTML conversion for documentation panels.
//!
//! The converter handles the GitHub-flavored subset used in panel
//! descriptions: headings with collision-free anchor ids, fenced and
//! indented code, tables, task lists, block quotes, raw HTML, inline and
//! reference links, emphasis, strikethrough and bare URLs.
//!
//! # Architecture
//!
//! Conversion runs in three passes over a single document:
//! - Block tokenization splits the source into [`BlockToken`]s and collects
//!   top-level link reference definitions.
//! - Inline tokenization fills every block with [`InlineToken`] trees, now
//!   that all link definitions are known.
//! - Rendering consumes the tokens front to back and writes HTML, minting a
//!   slug for every heading and recording it in the table of contents.
//!
//! Link and slug tables live for one call only. Raw HTML in the source is
//! passed through unchanged, so input must be trusted.
//!
//! # Example
//!
//! ```
//! let html = mdpanel_markdown::to_html("# Title\n\nSome *text*.").unwrap();
//!
//! assert_eq!(html, "<h1 id=\"title\">Title</h1>\n<p>Some <em>text</em>.</p>\n");
//! ```

mod block;
mod error;
mod escape;
mod inline;
mod links;
mod markdown;
mod render;
mod slug;

pub use block::{Align, BlockToken, List, ListItem, Table};
pub use error::MarkdownError;
pub use escape::{escape_for_attribute, escape_for_content, unescape_backslash, unescape_html};
pub use inline::InlineToken;
pub use links::{LinkReference, LinkReferences};
pub use markdown::{
    Document, Markdown, RenderOptions, RenderResult, render_tokens, to_html, to_html_or_escaped,
    tokenize,
};
pub use render::TocEntry;
pub use slug::{SlugTable, slugify};
