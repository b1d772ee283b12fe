//! Conversion entry points.

use crate::block::{self, BlockToken};
use crate::error::MarkdownError;
use crate::escape::escape_for_attribute;
use crate::links::LinkReferences;
use crate::render::{Renderer, TocEntry};

/// Options controlling HTML output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prefix of the class on `<code>` in fenced blocks with a language.
    pub lang_prefix: String,
    /// Emit `id` attributes on headings.
    pub heading_ids: bool,
    /// Prepended to every heading id.
    pub heading_id_prefix: String,
    /// `target` attribute for links.
    pub link_target: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            lang_prefix: "language-".to_owned(),
            heading_ids: true,
            heading_id_prefix: String::new(),
            link_target: None,
        }
    }
}

/// Result of rendering markdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered HTML.
    pub html: String,
    /// Headings in document order.
    pub toc: Vec<TocEntry>,
}

/// Token stream of a document after both tokenizer passes.
#[derive(Clone, Debug)]
pub struct Document {
    pub blocks: Vec<BlockToken>,
    /// Link definitions found at the top level.
    pub links: LinkReferences,
}

/// Markdown to HTML converter.
///
/// Holds only options; every call tokenizes and renders with fresh link
/// and slug tables, so one value can be shared between threads.
///
/// # Example
///
/// ```
/// use mdpanel_markdown::Markdown;
///
/// let result = Markdown::new()
///     .with_heading_id_prefix("doc-")
///     .render("# Hello\n\n**Bold** text")
///     .unwrap();
///
/// assert_eq!(
///     result.html,
///     "<h1 id=\"doc-hello\">Hello</h1>\n<p><strong>Bold</strong> text</p>\n"
/// );
/// assert_eq!(result.toc[0].id, "doc-hello");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Markdown {
    options: RenderOptions,
}

impl Markdown {
    /// Create a converter with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Set the class prefix for code block languages.
    #[must_use]
    pub fn with_lang_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.lang_prefix = prefix.into();
        self
    }

    /// Enable or disable heading `id` attributes.
    #[must_use]
    pub fn with_heading_ids(mut self, enabled: bool) -> Self {
        self.options.heading_ids = enabled;
        self
    }

    #[must_use]
    pub fn with_heading_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.heading_id_prefix = prefix.into();
        self
    }

    /// Open links in the given browsing context, e.g. `_blank`.
    #[must_use]
    pub fn with_link_target(mut self, target: impl Into<String>) -> Self {
        self.options.link_target = Some(target.into());
        self
    }

    /// Convert markdown to HTML and collect the table of contents.
    ///
    /// # Errors
    ///
    /// Returns an error if a tokenizer finds input no rule consumes.
    pub fn render(&self, source: &str) -> Result<RenderResult, MarkdownError> {
        let document = tokenize(source)?;
        Ok(self.render_document(document))
    }

    /// Render an already tokenized document.
    pub fn render_document(&self, document: Document) -> RenderResult {
        render_tokens(document.blocks, &self.options)
    }

    /// Convert markdown to HTML.
    ///
    /// # Errors
    ///
    /// Returns an error if a tokenizer finds input no rule consumes.
    pub fn to_html(&self, source: &str) -> Result<String, MarkdownError> {
        self.render(source).map(|result| result.html)
    }
}

/// Tokenize a document: block structure first, then inline content of
/// every block once all link definitions are known.
///
/// Line endings are normalized to `\n` and tabs expanded to four spaces.
///
/// # Errors
///
/// Returns an error if a tokenizer finds input no rule consumes.
pub fn tokenize(source: &str) -> Result<Document, MarkdownError> {
    let source = source.replace("\r\n", "\n").replace('\r', "\n").replace('\t', "    ");
    let mut links = LinkReferences::new();
    let mut blocks = block::tokenize(&source, &mut links, true)?;
    tracing::debug!(
        blocks = blocks.len(),
        definitions = links.len(),
        "Tokenized block structure"
    );
    block::tokenize_inlines(&mut blocks, &links)?;
    Ok(Document { blocks, links })
}

/// Render block tokens whose inline content has been tokenized.
pub fn render_tokens(tokens: Vec<BlockToken>, options: &RenderOptions) -> RenderResult {
    let (html, toc) = Renderer::new(options).render(tokens);
    tracing::debug!(bytes = html.len(), headings = toc.len(), "Rendered document");
    RenderResult { html, toc }
}

/// Convert markdown to HTML with default options.
///
/// # Errors
///
/// Returns an error if a tokenizer finds input no rule consumes.
pub fn to_html(source: &str) -> Result<String, MarkdownError> {
    Markdown::new().to_html(source)
}

/// Convert markdown to HTML, falling back to the escaped source in a single
/// paragraph if conversion fails.
pub fn to_html_or_escaped(source: &str) -> String {
    match to_html(source) {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!(error = %err, "Markdown conversion failed, rendering source as text");
            format!("<p>{}</p>\n", escape_for_attribute(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_reference_link_with_title() {
        let html = to_html("[click][a]\n\n[a]: http://x.test \"T\"\n").unwrap();

        assert_eq!(html, "<p><a href=\"http://x.test\" title=\"T\">click</a></p>\n");
    }

    #[test]
    fn test_missing_reference_is_literal() {
        let html = to_html("[click][missing]").unwrap();

        assert_eq!(html, "<p>[click][missing]</p>\n");
    }

    #[test]
    fn test_strong_with_nested_em() {
        let html = to_html("**bold *and* nested**").unwrap();

        assert_eq!(html, "<p><strong>bold <em>and</em> nested</strong></p>\n");
    }

    #[test]
    fn test_python_fence() {
        let html = to_html("```python\nprint(1)\n```").unwrap();

        assert_eq!(html, "<pre><code class=\"language-python\">print(1)</code></pre>\n");
    }

    #[test]
    fn test_definition_in_blockquote_is_not_registered() {
        let document = tokenize("> [a]: http://x.test\n\n[text][a]\n").unwrap();
        assert!(document.links.is_empty());

        let html = Markdown::new().render_document(document).html;
        assert!(html.starts_with("<blockquote>\n"), "{html}");
        assert!(html.ends_with("</blockquote>\n<p>[text][a]</p>\n"), "{html}");
    }

    #[test]
    fn test_definition_in_list_item_is_not_registered() {
        let document = tokenize("- [a]: http://x.test\n\n[t][a]\n").unwrap();
        assert!(document.links.is_empty());

        let html = Markdown::new().render_document(document).html;
        assert!(html.starts_with("<ul>\n<li>"), "{html}");
        assert!(html.ends_with("</ul>\n<p>[t][a]</p>\n"), "{html}");
    }

    #[test]
    fn test_strong_underscores_around_snake_case() {
        assert_eq!(
            to_html("__snake_case__").unwrap(),
            "<p><strong>snake_case</strong></p>\n"
        );
    }

    #[test]
    fn test_deeply_nested_quotes_do_not_overflow() {
        let source = format!("{}x", "> ".repeat(5000));

        let html = to_html(&source).unwrap();

        assert!(html.starts_with("<blockquote>\n<blockquote>\n"));
        assert!(html.contains("&gt; x</p>\n</blockquote>\n"), "{}", &html[html.len() - 200..]);
    }

    #[test]
    fn test_plain_text_round_trip() {
        assert_eq!(to_html("just some words").unwrap(), "<p>just some words</p>\n");
        assert_eq!(to_html("a < b").unwrap(), "<p>a &lt; b</p>\n");
    }

    #[test]
    fn test_output_is_deterministic() {
        let source = "# A\n\n# A\n\n- [x] t\n\n| x |\n|---|\n| 1 |\n";

        assert_eq!(to_html(source).unwrap(), to_html(source).unwrap());
    }

    #[test]
    fn test_line_endings_and_tabs_are_normalized() {
        let document = tokenize("a\r\nb\rc\n\n\tcode\n").unwrap();

        assert_eq!(
            Markdown::new().render_document(document).html,
            "<p>a\nb\nc</p>\n<pre><code>code</code></pre>\n"
        );
    }

    #[test]
    fn test_first_definition_wins() {
        let html = to_html("[x]\n\n[x]: /first\n[x]: /second\n").unwrap();

        assert_eq!(html, "<p><a href=\"/first\">x</a></p>\n");
    }

    #[test]
    fn test_escaped_fallback_leaves_valid_input_alone() {
        assert_eq!(to_html_or_escaped("*hi*"), "<p><em>hi</em></p>\n");
    }

    #[test]
    fn test_options_builder() {
        let markdown = Markdown::new()
            .with_lang_prefix("lang-")
            .with_heading_ids(false)
            .with_heading_id_prefix("p-")
            .with_link_target("_top");

        assert_eq!(
            markdown.options(),
            &RenderOptions {
                lang_prefix: "lang-".to_owned(),
                heading_ids: false,
                heading_id_prefix: "p-".to_owned(),
                link_target: Some("_top".to_owned()),
            }
        );
    }
}
