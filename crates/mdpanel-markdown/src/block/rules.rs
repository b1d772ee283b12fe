//! Block grammar.
//!
//! Rules that only look at the text they consume are regexes. Rules whose
//! end depends on what follows them (fences, lists, HTML blocks, table rows,
//! paragraph continuation) are scanned by hand.

use std::sync::LazyLock;

use regex::Regex;

use super::Align;

pub(super) static NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\n+").unwrap());

pub(super) static INDENTED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?: {4}[^\n]+\n*)+").unwrap());

pub(super) static CODE_INDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ {4}").unwrap());

pub(super) static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6}) +([^\n]*?)(?: +#+)? *(?:\n+|$)").unwrap());

pub(super) static HR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^ {{0,3}}{HR_BODY}(?:\n+|$)")).unwrap());

pub(super) static SETEXT_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\n]+)\n {0,3}(=+|-+) *(?:\n+|$)").unwrap());

pub(super) static TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\n]+").unwrap());

pub(super) static BLOCKQUOTE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ *> ?").unwrap());

pub(super) static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ +$").unwrap());

static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^ {0,3}\[((?:\\[\[\]]|[^\[\]])+)\]: *\n? *<?([^\s>]+)>?(?:(?: +\n? *| *\n *)((?:"(?:\\"?|[^"\\])*"|'[^'\n]*(?:\n[^'\n]+)*\n?'|\([^()]*\))))? *(?:\n+|$)"#,
    )
    .unwrap()
});

static NPTABLE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *([^|\n ].*\|.*)\n {0,3}([-:]+ *\|[-| :]*)").unwrap());

static TABLE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *\|(.+)\n {0,3}\|?( *[-:]+[-| :]*)").unwrap());

static LIST_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( {0,3})((?:[*+-]|[0-9]{1,9}[.)])) ").unwrap());

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *((?:[*+-]|[0-9]{1,9}[.)])) ?").unwrap());

static HR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^{HR_BODY}(?:\n|$)")).unwrap());

static PARAGRAPH_INTERRUPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&interrupt_pattern("")).unwrap());

static TABLE_ROW_INTERRUPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&interrupt_pattern(r"| {4}[^\n]")).unwrap());

const HR_BODY: &str = r"(?:(?:- *){3,}|(?:_ *){3,}|(?:\* *){3,})";

const BLOCK_TAGS: [&str; 63] = [
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "meta", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "section",
    "source", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track",
    "ul",
];

/// Tags whose content is taken verbatim up to the matching close tag.
const RAW_TEXT_TAGS: [&str; 3] = ["script", "pre", "style"];

/// Lines that end a paragraph (or table body) without a blank line.
fn interrupt_pattern(extra: &str) -> String {
    format!(
        concat!(
            r"^(?: {{0,3}}{hr}(?:\n|$)",
            r"| {{0,3}}#{{1,6}} ",
            r"| {{0,3}}>",
            r"| {{0,3}}(?:`{{3,}}[^`\n]*\n|~{{3,}}[^\n]*\n)",
            r"| {{0,3}}(?:[*+-]|1[.)]) ",
            r"|(?i:</?(?:{tags})(?: +|\n|/?>)|<(?:script|pre|style|textarea|!--))",
            r"{extra})"
        ),
        hr = HR_BODY,
        tags = BLOCK_TAGS.join("|"),
        extra = extra,
    )
}

fn leading_spaces(s: &str) -> usize {
    s.bytes().take_while(|&b| b == b' ').count()
}

fn line_end(s: &str, from: usize) -> usize {
    s[from..].find('\n').map_or(s.len(), |i| from + i)
}

fn newline_run(s: &str) -> usize {
    s.bytes().take_while(|&b| b == b'\n').count()
}

/// Lines starting at `s` until a blank line or an interrupting construct.
///
/// Returns the length without the final newline.
fn continued_lines(s: &str, interrupt: &Regex) -> Option<usize> {
    if s.is_empty() || s.starts_with('\n') {
        return None;
    }
    let mut end = line_end(s, 0);
    while end < s.len() {
        let line = &s[end + 1..];
        if line.is_empty() || line.starts_with('\n') || interrupt.is_match(line) {
            break;
        }
        end = line_end(s, end + 1);
    }
    Some(end)
}

pub(super) fn paragraph(s: &str) -> Option<usize> {
    continued_lines(s, &PARAGRAPH_INTERRUPT)
}

/// Fenced code block.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Fence {
    pub len: usize,
    pub language: Option<String>,
    pub text: String,
}

pub(super) fn fenced_code(s: &str) -> Option<Fence> {
    let indent = leading_spaces(s);
    if indent > 3 {
        return None;
    }
    let marker = *s.as_bytes().get(indent)?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let run = s[indent..].bytes().take_while(|&b| b == marker).count();
    if run < 3 {
        return None;
    }
    let fence = &s[indent..indent + run];
    let info_start = indent + run;
    let info_end = info_start + s[info_start..].find('\n')?;
    let info = &s[info_start..info_end];
    if marker == b'`' && info.contains('`') {
        return None;
    }

    let body_start = info_end + 1;
    let mut candidate = body_start;
    let len = loop {
        if let Some(close) = closing_fence(&s[candidate..], fence) {
            break candidate + close;
        }
        candidate += s[candidate..].find('\n')? + 1;
    };
    let content = if candidate > body_start {
        &s[body_start..candidate - 1]
    } else {
        ""
    };

    let text = if indent > 0 && marker == b'`' {
        content
            .split('\n')
            .map(|line| {
                let ws = line.bytes().take_while(u8::is_ascii_whitespace).count();
                if ws >= indent { &line[indent..] } else { line }
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        content.to_owned()
    };

    let language = info.trim();
    Some(Fence {
        len,
        language: (!language.is_empty()).then(|| language.to_owned()),
        text,
    })
}

/// Closing fence at the start of `s` with its trailing newlines.
///
/// The end of input closes any fence.
fn closing_fence(s: &str, fence: &str) -> Option<usize> {
    if s.is_empty() {
        return Some(0);
    }
    let indent = leading_spaces(s);
    if indent > 3 || !s[indent..].starts_with(fence) {
        return None;
    }
    let mut end = indent + fence.len();
    end += s[end..].bytes().take_while(|&b| b == b'~' || b == b'`').count();
    end += leading_spaces(&s[end..]);
    (end == s.len() || s[end..].starts_with('\n')).then(|| end + newline_run(&s[end..]))
}

/// Parsed table before inline tokenization.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct TableBlock {
    pub len: usize,
    pub header: Vec<String>,
    pub align: Vec<Option<Align>>,
    pub rows: Vec<Vec<String>>,
}

/// Table with an optional leading pipe (`piped == false`) or a required one.
///
/// Returns `None` when the delimiter row has a different column count than
/// the header.
pub(super) fn table(s: &str, piped: bool) -> Option<TableBlock> {
    let caps = if piped {
        TABLE_HEAD.captures(s)?
    } else {
        NPTABLE_HEAD.captures(s)?
    };
    let mut pos = caps.get(0)?.end();
    let rows_text = if pos == s.len() {
        ""
    } else if s[pos..].starts_with('\n') {
        pos += 1;
        if piped {
            pos += leading_spaces(&s[pos..]);
        }
        let rows_start = pos;
        while pos < s.len() {
            let line = &s[pos..];
            if line.starts_with('\n') || TABLE_ROW_INTERRUPT.is_match(line) {
                break;
            }
            pos = (line_end(s, pos) + 1).min(s.len());
        }
        let rows = &s[rows_start..pos];
        pos += newline_run(&s[pos..]);
        rows
    } else {
        return None;
    };

    let header = split_cells(strip_header_edges(&caps[1]), None);
    let align: Vec<Option<Align>> = strip_align_edges(&caps[2])
        .split('|')
        .map(parse_align)
        .collect();
    if header.len() != align.len() {
        return None;
    }

    let rows_text = rows_text.strip_suffix('\n').unwrap_or(rows_text);
    let rows = if rows_text.is_empty() {
        Vec::new()
    } else {
        rows_text
            .split('\n')
            .map(|row| {
                let row = if piped { strip_row_edges(row) } else { row };
                split_cells(row, Some(header.len()))
            })
            .collect()
    };

    Some(TableBlock {
        len: pos,
        header,
        align,
        rows,
    })
}

/// Strip `^ *` and a trailing ` *\| *`.
fn strip_header_edges(row: &str) -> &str {
    let row = row.trim_start_matches(' ');
    match row.trim_end_matches(' ').strip_suffix('|') {
        Some(inner) => inner.trim_end_matches(' '),
        None => row,
    }
}

/// Strip `^ *` and a trailing `\| *`.
fn strip_align_edges(row: &str) -> &str {
    let row = row.trim_start_matches(' ');
    row.trim_end_matches(' ').strip_suffix('|').unwrap_or(row)
}

/// Strip a leading ` *\| *` and a trailing ` *\| *`.
fn strip_row_edges(row: &str) -> &str {
    let row = match row.trim_start_matches(' ').strip_prefix('|') {
        Some(inner) => inner.trim_start_matches(' '),
        None => row,
    };
    match row.trim_end_matches(' ').strip_suffix('|') {
        Some(inner) => inner.trim_end_matches(' '),
        None => row,
    }
}

fn parse_align(spec: &str) -> Option<Align> {
    let spec = spec.trim_matches(' ');
    let left = spec.starts_with(':');
    let right = spec.ends_with(':');
    let dashes = spec.trim_start_matches(':').trim_end_matches(':');
    let colons = usize::from(left) + usize::from(right);
    if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') || spec.len() != dashes.len() + colons
    {
        return None;
    }
    match (left, right) {
        (true, true) => Some(Align::Center),
        (true, false) => Some(Align::Left),
        (false, true) => Some(Align::Right),
        (false, false) => None,
    }
}

/// Split a row on unescaped pipes, padding or truncating to `count` cells.
pub(super) fn split_cells(row: &str, count: Option<usize>) -> Vec<String> {
    let mut spaced = String::with_capacity(row.len() + 8);
    let bytes = row.as_bytes();
    for (i, c) in row.char_indices() {
        if c == '|' {
            let backslashes = bytes[..i].iter().rev().take_while(|&&b| b == b'\\').count();
            if backslashes % 2 == 0 {
                spaced.push(' ');
            }
        }
        spaced.push(c);
    }

    let mut cells: Vec<&str> = spaced.split(" |").collect();
    if let Some(count) = count {
        cells.resize(count, "");
    }
    cells
        .into_iter()
        .map(|cell| cell.trim().replace("\\|", "|"))
        .collect()
}

/// Extent of a block quote, including lazily continued paragraph lines.
pub(super) fn blockquote(s: &str) -> Option<usize> {
    let mut pos = 0;
    while pos < s.len() {
        let line = &s[pos..];
        let indent = leading_spaces(line);
        if indent > 3 || !line[indent..].starts_with('>') {
            break;
        }
        let mut q = pos + indent + 1;
        if s[q..].starts_with(' ') {
            q += 1;
        }
        q += paragraph(&s[q..]).unwrap_or(0);
        if s[q..].starts_with('\n') {
            q += 1;
        }
        pos = q;
    }
    (pos > 0).then_some(pos)
}

/// List before its items are tokenized.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct ListBlock {
    pub len: usize,
    pub ordered: bool,
    pub start: u32,
    pub loose: bool,
    pub items: Vec<ListItemBlock>,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) struct ListItemBlock {
    pub text: String,
    pub checked: Option<bool>,
    pub loose: bool,
}

pub(super) fn list(s: &str) -> Option<ListBlock> {
    let caps = LIST_HEAD.captures(s)?;
    let indent = caps.get(1)?.as_str();
    let bullet = caps.get(2)?.as_str();
    let head_end = caps.get(0)?.end();
    let raw = &s[..list_len(s, indent, head_end)?];

    let ordered = bullet.len() > 1;
    let paren = bullet.ends_with(')');
    let start = if ordered {
        bullet[..bullet.len() - 1].parse().unwrap_or(1)
    } else {
        1
    };

    let items = item_spans(raw);
    let mut len = raw.len();
    let mut loose_list = false;
    let mut next_loose = false;
    let mut list_items = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let mut last = i == items.len() - 1;
        let prefix = BULLET.find(item).map_or(0, |m| m.end());
        let mut text = item[prefix..].to_owned();
        if text.contains("\n ") {
            text = strip_line_indent(&text, prefix);
        }

        if !last {
            let next_bullet = BULLET
                .captures(items[i + 1])
                .and_then(|c| c.get(1))
                .map_or("", |m| m.as_str());
            let switches = if ordered {
                next_bullet.len() == 1 || (!paren && next_bullet.ends_with(')'))
            } else {
                next_bullet.len() > 1
            };
            if switches {
                let rest = &items[i + 1..];
                len -= rest.iter().map(|s| s.len()).sum::<usize>() + rest.len() - 1;
                last = true;
            }
        }

        let mut loose = next_loose || has_inner_blank_line(&text);
        if !last {
            next_loose = text.ends_with('\n');
            loose |= next_loose;
        }
        loose_list |= loose;

        let mut checked = None;
        if let Some(rest) = task_marker(&text) {
            checked = Some(text.as_bytes()[1] != b' ');
            text = rest.trim_start_matches(' ').to_owned();
        }

        list_items.push(ListItemBlock {
            text,
            checked,
            loose,
        });
        if last {
            break;
        }
    }

    Some(ListBlock {
        len,
        ordered,
        start,
        loose: loose_list,
        items: list_items,
    })
}

/// End of the list starting at `s`, scanning from the first body character.
fn list_len(s: &str, indent: &str, head_end: usize) -> Option<usize> {
    let content_end = s.trim_end().len();
    let mut end = head_end + s[head_end..].chars().next()?.len_utf8();
    loop {
        if end >= content_end {
            return Some(s.len());
        }
        let rest = &s[end..];
        if rest.starts_with('\n')
            && let Some(run) = list_break(rest, indent)
        {
            return Some(end + run);
        }
        end += rest.chars().next()?.len_utf8();
    }
}

/// Newlines ending a list: before a thematic break or a definition, or a
/// blank line not followed by an indented line or a sibling bullet.
fn list_break(rest: &str, indent: &str) -> Option<usize> {
    let run = newline_run(rest);
    let after = &rest[run..];
    let hr_follows = after
        .strip_prefix(indent)
        .is_some_and(|a| HR_LINE.is_match(a))
        || HR_LINE.is_match(after);
    if hr_follows || DEFINITION.is_match(after) {
        return Some(run);
    }
    let sibling = after
        .strip_prefix(indent)
        .and_then(|a| LIST_HEAD.find(a).filter(|m| m.start() == 0 && !a.starts_with(' ')))
        .is_some();
    if run >= 3 || (run == 2 && !after.starts_with(' ') && !sibling) {
        return Some(run);
    }
    None
}

/// Split a list into raw items, one per line starting with a bullet at the
/// item's own indentation.
fn item_spans(raw: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    while start < raw.len() {
        let indent = leading_spaces(&raw[start..]);
        let mut end = line_end(raw, start);
        while end < raw.len() {
            let next = &raw[end + 1..];
            if leading_spaces(next) == indent && BULLET.is_match(&next[indent..]) {
                break;
            }
            end = line_end(raw, end + 1);
        }
        items.push(&raw[start..end]);
        start = end + 1;
    }
    items
}

/// Remove up to `width` leading spaces from every line.
fn strip_line_indent(text: &str, width: usize) -> String {
    text.split('\n')
        .map(|line| &line[leading_spaces(line).min(width)..])
        .collect::<Vec<_>>()
        .join("\n")
}

/// A blank line followed by more content.
fn has_inner_blank_line(text: &str) -> bool {
    text.match_indices("\n\n")
        .any(|(i, _)| !text[i + 2..].trim().is_empty())
}

/// Text after a `[ ] `, `[x] ` or `[X] ` prefix.
fn task_marker(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let marked = bytes.len() >= 4
        && bytes[0] == b'['
        && matches!(bytes[1], b' ' | b'x' | b'X')
        && bytes[2] == b']'
        && bytes[3] == b' ';
    marked.then(|| &text[4..])
}

/// Raw HTML block: returns its length and whether it holds raw text content.
pub(super) fn html_block(s: &str) -> Option<(usize, bool)> {
    let indent = leading_spaces(s);
    if indent > 3 {
        return None;
    }
    let t = &s[indent..];
    if !t.starts_with('<') {
        return None;
    }
    let lower = t.to_ascii_lowercase();

    if let Some(len) = raw_text_block(t, &lower) {
        return Some((indent + len, true));
    }
    let len = if let Some(body) = t.strip_prefix("<!--") {
        comment_block(body).map(|len| len + 4)
    } else if t.starts_with("<?") {
        Some(until_then_newlines(t, 2, "?>"))
    } else if lower.starts_with("<![cdata[") {
        Some(until_then_newlines(t, 9, "]]>"))
    } else if t.len() > 2 && t.as_bytes()[1] == b'!' && t.as_bytes()[2].is_ascii_alphabetic() {
        Some(until_then_newlines(t, 2, ">"))
    } else {
        block_tag(t, &lower).or_else(|| standalone_tag(t, &lower))
    };
    len.map(|len| (indent + len, false))
}

/// `<script>`, `<pre>` or `<style>` up to a close tag that ends its line.
fn raw_text_block(t: &str, lower: &str) -> Option<usize> {
    let name = RAW_TEXT_TAGS.iter().find(|name| {
        lower[1..].starts_with(*name)
            && lower
                .as_bytes()
                .get(1 + name.len())
                .is_some_and(|&b| b == b'>' || b.is_ascii_whitespace())
    })?;
    let close = format!("</{name}>");
    let mut from = 2 + name.len();
    while let Some(i) = lower[from..].find(&close) {
        let after = from + i + close.len();
        let nl = line_end(t, after);
        if nl < t.len() {
            return Some(nl + newline_run(&t[nl..]));
        }
        from += i + 1;
    }
    Some(t.len())
}

fn comment_block(body: &str) -> Option<usize> {
    if body.starts_with('>') || body.starts_with("->") {
        return None;
    }
    let close = body.find("-->")? + 3;
    let nl = line_end(body, close);
    Some(nl + newline_run(&body[nl..]))
}

/// Up to and including `close` plus trailing newlines, or to the end.
fn until_then_newlines(t: &str, from: usize, close: &str) -> usize {
    match t[from..].find(close) {
        Some(i) => {
            let end = from + i + close.len();
            end + newline_run(&t[end..])
        }
        None => t.len(),
    }
}

/// Up to a blank line (consuming the newline run) or the end.
fn until_blank_line(t: &str, from: usize) -> usize {
    match t[from..].find("\n\n") {
        Some(i) => from + i + newline_run(&t[from + i..]),
        None => t.len(),
    }
}

fn tag_name_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    1 + bytes[1..]
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        .count()
}

/// Open or close tag of a known block element.
fn block_tag(t: &str, lower: &str) -> Option<usize> {
    let name_start = if lower.starts_with("</") { 2 } else { 1 };
    let name_len = lower[name_start..]
        .bytes()
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    let name = &lower[name_start..name_start + name_len];
    if !BLOCK_TAGS.contains(&name) {
        return None;
    }
    let rest = &t[name_start + name_len..];
    let after = if rest.starts_with(' ') {
        leading_spaces(rest)
    } else if rest.starts_with('\n') || rest.starts_with('>') {
        1
    } else if rest.starts_with("/>") {
        2
    } else {
        return None;
    };
    Some(until_blank_line(t, name_start + name_len + after))
}

/// Any other complete open or close tag alone on its line.
fn standalone_tag(t: &str, lower: &str) -> Option<usize> {
    let closing = lower.starts_with("</");
    let name_start = if closing { 2 } else { 1 };
    let name_len = tag_name_len(&t[name_start..]);
    if name_len == 0 {
        return None;
    }
    let name = &lower[name_start..name_start + name_len];
    if RAW_TEXT_TAGS.iter().any(|raw| name.starts_with(raw)) {
        return None;
    }
    let mut pos = name_start + name_len;
    let tag_end = if closing {
        pos += t[pos..].bytes().take_while(u8::is_ascii_whitespace).count();
        t[pos..].starts_with('>').then_some(pos + 1)?
    } else {
        loop {
            if let Some(end) = tag_close(t, pos) {
                break end;
            }
            pos = attribute(t, pos)?;
        }
    };
    let trailing = t[tag_end..]
        .bytes()
        .take_while(|&b| b == b' ' || b == b'\t')
        .count();
    let line_rest = &t[tag_end + trailing..];
    if !(line_rest.is_empty() || line_rest.starts_with('\n')) {
        return None;
    }
    Some(until_blank_line(t, tag_end))
}

/// ` */?>` at `pos`.
fn tag_close(t: &str, pos: usize) -> Option<usize> {
    let pos = pos + leading_spaces(&t[pos..]);
    let rest = &t[pos..];
    if rest.starts_with("/>") {
        Some(pos + 2)
    } else if rest.starts_with('>') {
        Some(pos + 1)
    } else {
        None
    }
}

/// One ` name`, ` name="v"`, ` name='v'` or ` name=v` attribute at `pos`.
fn attribute(t: &str, pos: usize) -> Option<usize> {
    let spaces = leading_spaces(&t[pos..]);
    if spaces == 0 {
        return None;
    }
    let mut p = pos + spaces;
    let bytes = t.as_bytes();
    if !bytes
        .get(p)
        .is_some_and(|&b| b.is_ascii_alphabetic() || b == b':' || b == b'_')
    {
        return None;
    }
    p += 1 + bytes[p + 1..]
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-'))
        .count();

    let eq = p + leading_spaces(&t[p..]);
    if bytes.get(eq) == Some(&b'=') {
        let v = eq + 1 + leading_spaces(&t[eq + 1..]);
        let value = quoted(t, v, '"')
            .or_else(|| quoted(t, v, '\''))
            .or_else(|| unquoted(t, v));
        if value.is_some() {
            return value;
        }
    }
    Some(p)
}

fn quoted(t: &str, pos: usize, quote: char) -> Option<usize> {
    let body = t[pos..].strip_prefix(quote)?;
    let close = body.find([quote, '\n'])?;
    body[close..]
        .starts_with(quote)
        .then_some(pos + 1 + close + 1)
}

fn unquoted(t: &str, pos: usize) -> Option<usize> {
    let len = t[pos..]
        .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`'))
        .unwrap_or(t.len() - pos);
    (len > 0).then_some(pos + len)
}

/// Link reference definition.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Definition {
    pub len: usize,
    pub label: String,
    pub href: String,
    pub title: Option<String>,
}

pub(super) fn definition(s: &str) -> Option<Definition> {
    let caps = DEFINITION.captures(s)?;
    let label = caps.get(1)?.as_str();
    if label.trim().is_empty() {
        return None;
    }
    let title = caps.get(3).map(|t| {
        let t = t.as_str();
        t[1..t.len() - 1].to_owned()
    });
    Some(Definition {
        len: caps.get(0)?.end(),
        label: label.to_owned(),
        href: caps[2].to_owned(),
        title,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_fenced_code_with_language() {
        let fence = fenced_code("```python\nprint(1)\n```\nafter").unwrap();

        assert_eq!(
            fence,
            Fence {
                len: 23,
                language: Some("python".to_owned()),
                text: "print(1)".to_owned(),
            }
        );
    }

    #[test]
    fn test_fenced_code_unterminated_runs_to_end() {
        let fence = fenced_code("~~~\na\nb\n").unwrap();

        assert_eq!(fence.len, 8);
        assert_eq!(fence.text, "a\nb");
        assert_eq!(fence.language, None);
    }

    #[test]
    fn test_fenced_code_strips_shared_indent() {
        let fence = fenced_code("  ```\n  one\n    two\nthree\n  ```").unwrap();

        assert_eq!(fence.text, "one\n  two\nthree");
    }

    #[test]
    fn test_fenced_code_rejects_backtick_in_info() {
        assert_eq!(fenced_code("``` a`b\ncode\n```"), None);
        assert_eq!(fenced_code("```"), None);
    }

    #[test]
    fn test_closing_fence_must_be_at_least_as_long() {
        let fence = fenced_code("````\n```\n````").unwrap();

        assert_eq!(fence.text, "```");
    }

    #[test]
    fn test_split_cells_escaped_pipe() {
        assert_eq!(split_cells(r"a | b \| c | d", None), vec!["a", "b | c", "d"]);
    }

    #[test]
    fn test_split_cells_pads_and_truncates() {
        assert_eq!(split_cells("a", Some(3)), vec!["a", "", ""]);
        assert_eq!(split_cells("a | b | c", Some(2)), vec!["a", "b"]);
    }

    #[test]
    fn test_table_alignment() {
        let table = table("| a | b | c | d |\n|:--|:-:|--:|---|\n| 1 | 2 | 3 | 4 |\n", true).unwrap();

        assert_eq!(
            table.align,
            vec![Some(Align::Left), Some(Align::Center), Some(Align::Right), None]
        );
        assert_eq!(table.header, vec!["a", "b", "c", "d"]);
        assert_eq!(table.rows, vec![vec!["1", "2", "3", "4"]]);
    }

    #[test]
    fn test_table_column_mismatch_is_rejected() {
        assert_eq!(table("a | b\n--|--|--\n", false), None);
    }

    #[test]
    fn test_nptable_without_body() {
        let table = table("a | b\n--|--", false).unwrap();

        assert_eq!(table.len, 11);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_table_rows_stop_at_blank_line() {
        let table = table("a | b\n--|--\n1 | 2\n\nnext", false).unwrap();

        assert_eq!(table.rows, vec![vec!["1", "2"]]);
        assert_eq!(table.len, 19);
    }

    #[test]
    fn test_paragraph_interrupted_by_heading() {
        assert_eq!(paragraph("one\ntwo\n# three"), Some(7));
        assert_eq!(paragraph("one\n\ntwo"), Some(3));
        assert_eq!(paragraph("one\n<div>"), Some(3));
    }

    #[test]
    fn test_blockquote_lazy_continuation() {
        assert_eq!(blockquote("> a\nb\n> c\n\nd"), Some(10));
    }

    #[test]
    fn test_list_tight() {
        let list = list("- a\n- b\n").unwrap();

        assert!(!list.ordered);
        assert!(!list.loose);
        assert_eq!(list.len, 8);
        let texts: Vec<_> = list.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b\n"]);
    }

    #[test]
    fn test_list_loose() {
        let list = list("1. a\n\n2. b").unwrap();

        assert!(list.ordered);
        assert!(list.loose);
        assert_eq!(list.start, 1);
    }

    #[test]
    fn test_list_start_number() {
        assert_eq!(list("3) x").unwrap().start, 3);
    }

    #[test]
    fn test_list_nested_item_indent() {
        let list = list("- a\n  - b\n- c").unwrap();

        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].text, "a\n- b");
    }

    #[test]
    fn test_list_switching_bullet_type_ends_list() {
        let list = list("- a\n- b\n1. c\n").unwrap();

        assert_eq!(list.items.len(), 2);
        assert_eq!(list.len, 8);
    }

    #[test]
    fn test_list_task_items() {
        let list = list("- [ ] todo\n- [x] done\n- plain").unwrap();
        let checked: Vec<_> = list.items.iter().map(|i| i.checked).collect();

        assert_eq!(checked, vec![Some(false), Some(true), None]);
        assert_eq!(list.items[0].text, "todo");
    }

    #[test]
    fn test_list_ends_before_thematic_break() {
        assert_eq!(list("- a\n***\n").unwrap().len, 4);
    }

    #[test]
    fn test_list_ends_after_double_blank() {
        assert_eq!(list("- a\n\n\nb").unwrap().len, 6);
    }

    #[test]
    fn test_html_block_div() {
        assert_eq!(html_block("<div>\nhi\n</div>\n\nafter"), Some((17, false)));
    }

    #[test]
    fn test_html_block_pre_keeps_blank_lines() {
        assert_eq!(html_block("<pre>\na\n\nb</pre>\nx"), Some((17, true)));
    }

    #[test]
    fn test_html_block_comment() {
        assert_eq!(html_block("<!-- note -->\n\nnext"), Some((15, false)));
    }

    #[test]
    fn test_html_block_custom_tag_must_end_line() {
        assert_eq!(html_block("<my-widget data-x=\"1\">\n"), Some((23, false)));
        assert_eq!(html_block("<span>text</span>"), None);
    }

    #[test]
    fn test_html_block_rejects_inline_start() {
        assert_eq!(html_block("<b>bold</b> text"), None);
        assert_eq!(html_block("    <div>"), None);
    }

    #[test]
    fn test_definition() {
        let def = definition("[Docs]: http://x.test \"T\"\nrest").unwrap();

        assert_eq!(
            def,
            Definition {
                len: 26,
                label: "Docs".to_owned(),
                href: "http://x.test".to_owned(),
                title: Some("T".to_owned()),
            }
        );
    }

    #[test]
    fn test_definition_angle_href_and_blank_label() {
        assert_eq!(definition("[a]: <http://x>").unwrap().href, "http://x");
        assert_eq!(definition("[ ]: http://x"), None);
    }
}
