//! HTML rendering of block and inline tokens.

use std::collections::VecDeque;

use crate::block::{Align, BlockToken, List, ListItem, Table};
use crate::escape::{escape_for_attribute, escape_for_content, unescape_html};
use crate::inline::InlineToken;
use crate::markdown::RenderOptions;
use crate::slug::{SlugTable, slugify};

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text with inline markup stripped and entities decoded.
    pub title: String,
    /// Anchor ID, including the configured prefix.
    pub id: String,
}

/// Renders one document.
///
/// Owns the slug table, so anchors are unique within a single render and
/// start over for the next one.
pub(crate) struct Renderer<'o> {
    options: &'o RenderOptions,
    slugs: SlugTable,
    toc: Vec<TocEntry>,
}

impl<'o> Renderer<'o> {
    pub(crate) fn new(options: &'o RenderOptions) -> Self {
        Self {
            options,
            slugs: SlugTable::new(),
            toc: Vec::new(),
        }
    }

    /// Render top-level blocks and return the HTML with the collected TOC.
    pub(crate) fn render(mut self, tokens: Vec<BlockToken>) -> (String, Vec<TocEntry>) {
        let html = self.blocks(tokens, true);
        (html, self.toc)
    }

    /// Render a block sequence.
    ///
    /// `top` wraps loose text in paragraphs; it is unset for the items of a
    /// tight list.
    fn blocks(&mut self, tokens: Vec<BlockToken>, top: bool) -> String {
        let mut out = String::new();
        let mut queue = VecDeque::from(tokens);
        while let Some(token) = queue.pop_front() {
            match token {
                BlockToken::Space => {}
                BlockToken::Hr => out.push_str("<hr>\n"),
                BlockToken::Heading { depth, tokens, .. } => self.heading(&mut out, depth, &tokens),
                BlockToken::Code { text, language } => self.code(&mut out, &text, language.as_deref()),
                BlockToken::Table(table) => self.table(&mut out, &table),
                BlockToken::Blockquote { tokens, .. } => {
                    out.push_str("<blockquote>\n");
                    out.push_str(&self.blocks(tokens, true));
                    out.push_str("</blockquote>\n");
                }
                BlockToken::List(list) => self.list(&mut out, list),
                BlockToken::Html { text, .. } => out.push_str(&text),
                BlockToken::Paragraph { tokens, .. } => {
                    out.push_str("<p>");
                    out.push_str(&self.inline(&tokens));
                    out.push_str("</p>\n");
                }
                BlockToken::Text { tokens, .. } => {
                    let mut body = self.inline(&tokens);
                    while let Some(BlockToken::Text { tokens, .. }) = queue.front() {
                        body.push('\n');
                        body.push_str(&self.inline(tokens));
                        queue.pop_front();
                    }
                    if top {
                        out.push_str("<p>");
                        out.push_str(&body);
                        out.push_str("</p>\n");
                    } else {
                        out.push_str(&body);
                    }
                }
            }
        }
        out
    }

    fn heading(&mut self, out: &mut String, depth: u8, tokens: &[InlineToken]) {
        let title = unescape_html(&plain_text(tokens)).into_owned();
        // Headings without any slug characters get no anchor.
        let id = (!slugify(&title).is_empty())
            .then(|| format!("{}{}", self.options.heading_id_prefix, self.slugs.slug(&title)));

        out.push_str(&format!("<h{depth}"));
        if self.options.heading_ids
            && let Some(id) = &id
        {
            out.push_str(&format!(r#" id="{}""#, escape_for_attribute(id)));
        }
        out.push('>');
        out.push_str(&self.inline(tokens));
        out.push_str(&format!("</h{depth}>\n"));

        if let Some(id) = id {
            self.toc.push(TocEntry {
                level: depth,
                title,
                id,
            });
        }
    }

    fn code(&self, out: &mut String, text: &str, language: Option<&str>) {
        let language = language.and_then(|info| info.split_whitespace().next());
        match language {
            Some(lang) => out.push_str(&format!(
                r#"<pre><code class="{}{}">"#,
                escape_for_attribute(&self.options.lang_prefix),
                escape_for_attribute(lang)
            )),
            None => out.push_str("<pre><code>"),
        }
        out.push_str(&escape_for_attribute(text));
        out.push_str("</code></pre>\n");
    }

    fn table(&self, out: &mut String, table: &Table) {
        out.push_str("<table>\n<thead>\n<tr>\n");
        for (i, cell) in table.header_tokens.iter().enumerate() {
            self.table_cell(out, "th", column_align(table, i), cell);
        }
        out.push_str("</tr>\n</thead>\n");

        if !table.row_tokens.is_empty() {
            out.push_str("<tbody>\n");
            for row in &table.row_tokens {
                out.push_str("<tr>\n");
                for (i, cell) in row.iter().enumerate() {
                    self.table_cell(out, "td", column_align(table, i), cell);
                }
                out.push_str("</tr>\n");
            }
            out.push_str("</tbody>\n");
        }
        out.push_str("</table>\n");
    }

    fn table_cell(&self, out: &mut String, tag: &str, align: Option<Align>, tokens: &[InlineToken]) {
        match align {
            Some(align) => out.push_str(&format!(r#"<{tag} align="{}">"#, align_name(align))),
            None => out.push_str(&format!("<{tag}>")),
        }
        out.push_str(&self.inline(tokens));
        out.push_str(&format!("</{tag}>\n"));
    }

    fn list(&mut self, out: &mut String, list: List) {
        let tag = if list.ordered { "ol" } else { "ul" };
        out.push_str(&format!("<{tag}"));
        if list.ordered && list.start != 1 {
            out.push_str(&format!(r#" start="{}""#, list.start));
        }
        out.push_str(">\n");
        for item in list.items {
            self.list_item(out, item, list.loose);
        }
        out.push_str(&format!("</{tag}>\n"));
    }

    fn list_item(&mut self, out: &mut String, mut item: ListItem, loose: bool) {
        out.push_str("<li>");
        if let Some(checked) = item.checked {
            let checkbox = checkbox(checked);
            if !loose {
                out.push_str(&checkbox);
            } else if let Some(
                BlockToken::Text { tokens, .. } | BlockToken::Paragraph { tokens, .. },
            ) = item.tokens.first_mut()
            {
                tokens.insert(0, InlineToken::Html(checkbox));
            } else {
                item.tokens.insert(
                    0,
                    BlockToken::Text {
                        text: checkbox.clone(),
                        tokens: vec![InlineToken::Html(checkbox)],
                    },
                );
            }
        }
        out.push_str(&self.blocks(item.tokens, loose));
        out.push_str("</li>\n");
    }

    fn inline(&self, tokens: &[InlineToken]) -> String {
        let mut out = String::new();
        for token in tokens {
            match token {
                InlineToken::Text(text) | InlineToken::Html(text) => out.push_str(text),
                InlineToken::Link {
                    href,
                    title,
                    tokens,
                } => {
                    out.push_str(&format!(r#"<a href="{}""#, escape_for_content(href)));
                    if let Some(title) = title {
                        out.push_str(&format!(r#" title="{}""#, escape_for_content(title)));
                    }
                    if let Some(target) = &self.options.link_target {
                        out.push_str(&format!(r#" target="{}""#, escape_for_attribute(target)));
                    }
                    out.push('>');
                    out.push_str(&self.inline(tokens));
                    out.push_str("</a>");
                }
                InlineToken::Image { href, title, alt } => {
                    out.push_str(&format!(
                        r#"<img src="{}" alt="{}""#,
                        escape_for_content(href),
                        escape_for_content(alt)
                    ));
                    if let Some(title) = title {
                        out.push_str(&format!(r#" title="{}""#, escape_for_content(title)));
                    }
                    out.push('>');
                }
                InlineToken::Strong(tokens) => wrap(&mut out, "strong", &self.inline(tokens)),
                InlineToken::Em(tokens) => wrap(&mut out, "em", &self.inline(tokens)),
                InlineToken::Codespan(code) => wrap(&mut out, "code", code),
                InlineToken::Br => out.push_str("<br>"),
                InlineToken::Del(tokens) => wrap(&mut out, "del", &self.inline(tokens)),
            }
        }
        out
    }
}

fn wrap(out: &mut String, tag: &str, content: &str) {
    out.push_str(&format!("<{tag}>{content}</{tag}>"));
}

fn checkbox(checked: bool) -> String {
    let checked = if checked { r#"checked="" "# } else { "" };
    format!(r#"<input {checked}disabled="" type="checkbox"> "#)
}

fn column_align(table: &Table, column: usize) -> Option<Align> {
    table.align.get(column).copied().flatten()
}

fn align_name(align: Align) -> &'static str {
    match align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}

/// Text content of inline tokens with all markup dropped.
///
/// Raw HTML and line breaks contribute nothing; link and emphasis text is
/// kept.
pub(crate) fn plain_text(tokens: &[InlineToken]) -> String {
    let mut out = String::new();
    collect_text(tokens, &mut out);
    out
}

fn collect_text(tokens: &[InlineToken], out: &mut String) {
    for token in tokens {
        match token {
            InlineToken::Text(text) | InlineToken::Codespan(text) => out.push_str(text),
            InlineToken::Image { alt, .. } => out.push_str(&escape_for_content(alt)),
            InlineToken::Link { tokens, .. }
            | InlineToken::Strong(tokens)
            | InlineToken::Em(tokens)
            | InlineToken::Del(tokens) => collect_text(tokens, out),
            InlineToken::Html(_) | InlineToken::Br => {}
        }
    }
}
