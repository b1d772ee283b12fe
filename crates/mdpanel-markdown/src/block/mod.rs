//! Block-level tokenization.
//!
//! The lexer walks the source front to back and tries the rules in a fixed
//! priority order; the first rule that matches the remaining prefix wins
//! and its match is cut off the front. Block quotes and list items recurse
//! into the same lexer without collecting link definitions.

mod rules;

use crate::error::{MarkdownError, snippet};
use crate::inline::{InlineToken, tokenize_inline};
use crate::links::{LinkReference, LinkReferences};

/// Table column alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Structural unit of a markdown document.
///
/// Inline tokens are filled in by the second pass of [`crate::tokenize`];
/// before that only the raw text is populated.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockToken {
    /// Blank line run separating blocks.
    Space,
    /// Thematic break.
    Hr,
    Heading {
        depth: u8,
        text: String,
        tokens: Vec<InlineToken>,
    },
    /// Indented or fenced code, stored without escaping.
    Code {
        text: String,
        language: Option<String>,
    },
    Table(Table),
    Blockquote {
        text: String,
        tokens: Vec<BlockToken>,
    },
    List(List),
    /// Raw HTML passed through verbatim.
    Html { text: String, pre: bool },
    Paragraph {
        text: String,
        tokens: Vec<InlineToken>,
    },
    /// Text inside a container that is not wrapped as a paragraph.
    Text {
        text: String,
        tokens: Vec<InlineToken>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub align: Vec<Option<Align>>,
    pub rows: Vec<Vec<String>>,
    pub header_tokens: Vec<Vec<InlineToken>>,
    pub row_tokens: Vec<Vec<Vec<InlineToken>>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub ordered: bool,
    /// First number of an ordered list, 1 otherwise.
    pub start: u32,
    /// Whether items are separated by blank lines.
    pub loose: bool,
    pub items: Vec<ListItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    /// `Some` for task items, holding the checkbox state.
    pub checked: Option<bool>,
    pub loose: bool,
    pub text: String,
    pub tokens: Vec<BlockToken>,
}

impl ListItem {
    pub fn is_task(&self) -> bool {
        self.checked.is_some()
    }
}

/// Deepest block quote or list nesting that is parsed as structure.
pub(crate) const MAX_NESTING: usize = 256;

/// Tokenize `source` into block tokens.
///
/// Link reference definitions are collected into `links` only when `top`
/// is set, which is the case for the document itself but not for block
/// quotes or list items.
pub(crate) fn tokenize(
    source: &str,
    links: &mut LinkReferences,
    top: bool,
) -> Result<Vec<BlockToken>, MarkdownError> {
    tokenize_nested(source, links, top, 0)
}

fn tokenize_nested(
    source: &str,
    links: &mut LinkReferences,
    top: bool,
    depth: usize,
) -> Result<Vec<BlockToken>, MarkdownError> {
    // Past the limit the container content is kept as plain text.
    if depth > MAX_NESTING {
        tracing::debug!(depth, "Nesting limit reached, keeping content as text");
        let text = source.trim_end_matches('\n');
        if text.is_empty() {
            return Ok(Vec::new());
        }
        return Ok(vec![BlockToken::Text {
            text: text.to_owned(),
            tokens: Vec::new(),
        }]);
    }

    let source = rules::BLANK_LINE.replace_all(source, "");
    let mut lexer = BlockLexer {
        links,
        top,
        depth,
        tokens: Vec::new(),
    };
    let mut offset = 0;
    while offset < source.len() {
        let rest = &source[offset..];
        let consumed = lexer
            .next_token(rest)?
            .ok_or_else(|| MarkdownError::UnmatchedBlock {
                offset,
                snippet: snippet(rest),
            })?;
        offset += consumed;
    }
    Ok(lexer.tokens)
}

struct BlockLexer<'l> {
    links: &'l mut LinkReferences,
    top: bool,
    depth: usize,
    tokens: Vec<BlockToken>,
}

impl BlockLexer<'_> {
    /// Apply the first matching rule, returning how much of `rest` it consumed.
    fn next_token(&mut self, rest: &str) -> Result<Option<usize>, MarkdownError> {
        if let Some(m) = rules::NEWLINE.find(rest) {
            if m.len() > 1 {
                self.tokens.push(BlockToken::Space);
            }
            return Ok(Some(m.end()));
        }

        if let Some(m) = rules::INDENTED_CODE.find(rest) {
            self.indented_code(m.as_str());
            return Ok(Some(m.end()));
        }

        if let Some(fence) = rules::fenced_code(rest) {
            self.tokens.push(BlockToken::Code {
                text: fence.text,
                language: fence.language,
            });
            return Ok(Some(fence.len));
        }

        if let Some(caps) = rules::HEADING.captures(rest) {
            self.tokens.push(BlockToken::Heading {
                depth: heading_depth(caps[1].len()),
                text: caps[2].to_owned(),
                tokens: Vec::new(),
            });
            return Ok(Some(caps[0].len()));
        }

        if let Some(table) = rules::table(rest, false) {
            return Ok(Some(self.push_table(table)));
        }

        if let Some(m) = rules::HR.find(rest) {
            self.tokens.push(BlockToken::Hr);
            return Ok(Some(m.end()));
        }

        if let Some(len) = rules::blockquote(rest) {
            let text = rules::BLOCKQUOTE_MARKER.replace_all(&rest[..len], "").into_owned();
            let tokens = tokenize_nested(&text, self.links, false, self.depth + 1)?;
            self.tokens.push(BlockToken::Blockquote { text, tokens });
            return Ok(Some(len));
        }

        if let Some(list) = rules::list(rest) {
            let items = list
                .items
                .into_iter()
                .map(|item| {
                    Ok(ListItem {
                        tokens: tokenize_nested(
                            &item.text,
                            self.links,
                            false,
                            self.depth + 1,
                        )?,
                        checked: item.checked,
                        loose: item.loose,
                        text: item.text,
                    })
                })
                .collect::<Result<Vec<_>, MarkdownError>>()?;
            self.tokens.push(BlockToken::List(List {
                ordered: list.ordered,
                start: list.start,
                loose: list.loose,
                items,
            }));
            return Ok(Some(list.len));
        }

        if let Some((len, pre)) = rules::html_block(rest) {
            self.tokens.push(BlockToken::Html {
                text: rest[..len].to_owned(),
                pre,
            });
            return Ok(Some(len));
        }

        if self.top
            && let Some(def) = rules::definition(rest)
        {
            tracing::debug!(label = %def.label, href = %def.href, "Link definition");
            self.links.define(
                &def.label,
                LinkReference {
                    href: def.href,
                    title: def.title,
                },
            );
            return Ok(Some(def.len));
        }

        if let Some(table) = rules::table(rest, true) {
            return Ok(Some(self.push_table(table)));
        }

        if let Some(caps) = rules::SETEXT_HEADING.captures(rest) {
            let depth = if caps[2].starts_with('=') { 1 } else { 2 };
            self.tokens.push(BlockToken::Heading {
                depth,
                text: caps[1].to_owned(),
                tokens: Vec::new(),
            });
            return Ok(Some(caps[0].len()));
        }

        if self.top
            && let Some(len) = rules::paragraph(rest)
        {
            self.tokens.push(BlockToken::Paragraph {
                text: rest[..len].to_owned(),
                tokens: Vec::new(),
            });
            return Ok(Some(len));
        }

        if let Some(m) = rules::TEXT.find(rest) {
            if let Some(BlockToken::Text { text, .. }) = self.tokens.last_mut() {
                text.push('\n');
                text.push_str(m.as_str());
            } else {
                self.tokens.push(BlockToken::Text {
                    text: m.as_str().to_owned(),
                    tokens: Vec::new(),
                });
            }
            return Ok(Some(m.end()));
        }

        Ok(None)
    }

    /// Indented code directly after a paragraph continues the paragraph.
    fn indented_code(&mut self, matched: &str) {
        if let Some(BlockToken::Paragraph { text, .. }) = self.tokens.last_mut() {
            text.push('\n');
            text.push_str(matched.trim_end());
            return;
        }
        let text = rules::CODE_INDENT.replace_all(matched, "");
        self.tokens.push(BlockToken::Code {
            text: text.trim_end_matches('\n').to_owned(),
            language: None,
        });
    }

    fn push_table(&mut self, table: rules::TableBlock) -> usize {
        self.tokens.push(BlockToken::Table(Table {
            header: table.header,
            align: table.align,
            rows: table.rows,
            header_tokens: Vec::new(),
            row_tokens: Vec::new(),
        }));
        table.len
    }
}

fn heading_depth(hashes: usize) -> u8 {
    u8::try_from(hashes).unwrap_or(6)
}

/// Second pass: tokenize the inline content of every block.
pub(crate) fn tokenize_inlines(
    tokens: &mut [BlockToken],
    links: &LinkReferences,
) -> Result<(), MarkdownError> {
    for token in tokens {
        match token {
            BlockToken::Heading { text, tokens, .. }
            | BlockToken::Paragraph { text, tokens }
            | BlockToken::Text { text, tokens } => {
                *tokens = tokenize_inline(text, links, false, false, None)?;
            }
            BlockToken::Table(table) => {
                table.header_tokens = table
                    .header
                    .iter()
                    .map(|cell| tokenize_inline(cell, links, false, false, None))
                    .collect::<Result<_, _>>()?;
                table.row_tokens = table
                    .rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|cell| tokenize_inline(cell, links, false, false, None))
                            .collect::<Result<_, _>>()
                    })
                    .collect::<Result<_, _>>()?;
            }
            BlockToken::Blockquote { tokens, .. } => tokenize_inlines(tokens, links)?,
            BlockToken::List(list) => {
                for item in &mut list.items {
                    tokenize_inlines(&mut item.tokens, links)?;
                }
            }
            BlockToken::Space | BlockToken::Hr | BlockToken::Code { .. } | BlockToken::Html { .. } => {}
        }
    }
    Ok(())
}
