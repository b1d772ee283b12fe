//! Inline tokenization.
//!
//! Runs over the raw text of a paragraph, heading, text run or table cell
//! and produces a tree of inline tokens. Link, code and tag spans are
//! masked in a copy of the text first, so emphasis delimiters inside them
//! cannot close an emphasis opened outside.

mod emphasis;
mod rules;

use crate::error::{MarkdownError, snippet};
use crate::escape::{escape_for_attribute, escape_for_content};
use crate::links::LinkReferences;

/// Inline content of a block.
///
/// Text and code span content is stored HTML-escaped, ready for output.
/// Link destinations, titles and image alt text are stored unescaped and
/// escaped when rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineToken {
    Text(String),
    /// Raw inline HTML.
    Html(String),
    Link {
        href: String,
        title: Option<String>,
        tokens: Vec<InlineToken>,
    },
    Image {
        href: String,
        title: Option<String>,
        alt: String,
    },
    Strong(Vec<InlineToken>),
    Em(Vec<InlineToken>),
    Codespan(String),
    Br,
    Del(Vec<InlineToken>),
}

/// Tokenize inline markdown.
///
/// `in_link` disables bare URL detection, `in_raw_block` disables escaping
/// of text (inside raw HTML such as `<pre>`), and `prev_char` is the last
/// character of preceding text, which decides whether an asterisk next to
/// punctuation may open emphasis.
pub(crate) fn tokenize_inline(
    text: &str,
    links: &LinkReferences,
    in_link: bool,
    in_raw_block: bool,
    prev_char: Option<char>,
) -> Result<Vec<InlineToken>, MarkdownError> {
    let lexer = InlineLexer {
        links,
        in_link,
        in_raw_block,
        prev_char,
        tokens: Vec::new(),
    };
    lexer.run(text)
}

struct InlineLexer<'l> {
    links: &'l LinkReferences,
    in_link: bool,
    in_raw_block: bool,
    prev_char: Option<char>,
    tokens: Vec<InlineToken>,
}

impl InlineLexer<'_> {
    fn run(mut self, text: &str) -> Result<Vec<InlineToken>, MarkdownError> {
        let masked = rules::mask(text, self.links);
        let email_ahead = rules::email_ahead(text);
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let consumed = self
                .next_token(rest, &masked[pos..], &email_ahead[pos..])?
                .ok_or_else(|| MarkdownError::UnmatchedInline {
                    snippet: snippet(rest),
                })?;
            pos += consumed;
        }
        Ok(self.tokens)
    }

    fn next_token(
        &mut self,
        rest: &str,
        masked: &str,
        email_ahead: &[bool],
    ) -> Result<Option<usize>, MarkdownError> {
        let prev_char = self.prev_char.take();

        if let Some(c) = rules::escape(rest) {
            let mut buf = [0; 4];
            let escaped = escape_for_content(c.encode_utf8(&mut buf)).into_owned();
            self.tokens.push(InlineToken::Text(escaped));
            return Ok(Some(2));
        }

        if let Some(len) = rules::tag(rest) {
            let html = &rest[..len];
            self.track_raw_html(html);
            self.tokens.push(InlineToken::Html(html.to_owned()));
            return Ok(Some(len));
        }

        if let Some(link) = rules::inline_link(rest) {
            self.push_link(link.image, link.href, link.title, &link.text)?;
            return Ok(Some(link.len));
        }

        if let Some(reference) = rules::reference_link(rest) {
            match self.links.get(&reference.label) {
                Some(target) if !target.href.is_empty() => {
                    let (href, title) = (target.href.clone(), target.title.clone());
                    self.push_link(reference.image, href, title, &reference.text)?;
                    return Ok(Some(reference.len));
                }
                _ => {
                    tracing::trace!(label = %reference.label, "Unresolved link reference");
                    let first = rest.chars().next().map_or(1, char::len_utf8);
                    self.tokens.push(InlineToken::Text(rest[..first].to_owned()));
                    return Ok(Some(first));
                }
            }
        }

        if let Some(len) = emphasis::strong(rest, masked, prev_char) {
            let tokens = self.nested(&rest[2..len - 2], self.in_link)?;
            self.tokens.push(InlineToken::Strong(tokens));
            return Ok(Some(len));
        }

        if let Some(len) = emphasis::em(rest, masked, prev_char) {
            let tokens = self.nested(&rest[1..len - 1], self.in_link)?;
            self.tokens.push(InlineToken::Em(tokens));
            return Ok(Some(len));
        }

        if let Some((len, code)) = rules::codespan(rest) {
            let code = escape_for_attribute(&code).into_owned();
            self.tokens.push(InlineToken::Codespan(code));
            return Ok(Some(len));
        }

        if let Some(len) = rules::br(rest) {
            self.tokens.push(InlineToken::Br);
            return Ok(Some(len));
        }

        if let Some((len, inner)) = rules::del(rest) {
            let tokens = self.nested(inner, self.in_link)?;
            self.tokens.push(InlineToken::Del(tokens));
            return Ok(Some(len));
        }

        if let Some(link) = rules::autolink(rest) {
            let len = link.len;
            self.push_autolink(link);
            return Ok(Some(len));
        }

        if !self.in_link
            && let Some(link) = rules::url(rest)
        {
            let len = link.len;
            self.push_autolink(link);
            return Ok(Some(len));
        }

        let len = rules::text(rest, email_ahead);
        if len > 0 {
            let raw = &rest[..len];
            let text = if self.in_raw_block {
                raw.to_owned()
            } else {
                escape_for_content(raw).into_owned()
            };
            self.prev_char = raw.chars().next_back();
            self.tokens.push(InlineToken::Text(text));
            return Ok(Some(len));
        }

        Ok(None)
    }

    fn nested(&self, text: &str, in_link: bool) -> Result<Vec<InlineToken>, MarkdownError> {
        tokenize_inline(text, self.links, in_link, self.in_raw_block, None)
    }

    fn push_link(
        &mut self,
        image: bool,
        href: String,
        title: Option<String>,
        text: &str,
    ) -> Result<(), MarkdownError> {
        let title = title.filter(|t| !t.is_empty());
        let token = if image {
            InlineToken::Image {
                href,
                title,
                alt: text.to_owned(),
            }
        } else {
            InlineToken::Link {
                href,
                title,
                tokens: self.nested(text, true)?,
            }
        };
        self.tokens.push(token);
        Ok(())
    }

    fn push_autolink(&mut self, link: rules::AutoLink) {
        let text = escape_for_content(&link.text).into_owned();
        self.tokens.push(InlineToken::Link {
            href: link.href,
            title: None,
            tokens: vec![InlineToken::Text(text)],
        });
    }

    /// Track whether raw HTML opened a link or a verbatim element.
    fn track_raw_html(&mut self, html: &str) {
        let lower = html.to_ascii_lowercase();
        if !self.in_link && lower.starts_with("<a ") {
            self.in_link = true;
        } else if self.in_link && lower.starts_with("</a>") {
            self.in_link = false;
        }
        if !self.in_raw_block && opens_raw_element(&lower, "<") {
            self.in_raw_block = true;
        } else if self.in_raw_block && opens_raw_element(&lower, "</") {
            self.in_raw_block = false;
        }
    }
}

/// `<pre`, `<code`, `<kbd` or `<script` (after `prefix`) followed by
/// whitespace or `>`.
fn opens_raw_element(lower: &str, prefix: &str) -> bool {
    let Some(rest) = lower.strip_prefix(prefix) else {
        return false;
    };
    ["pre", "code", "kbd", "script"].iter().any(|name| {
        rest.strip_prefix(name)
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c == '>' || c.is_whitespace())
    })
}
