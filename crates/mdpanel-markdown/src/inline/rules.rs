//! Inline grammar.

use std::sync::LazyLock;

use regex::Regex;

use crate::escape::unescape_backslash;
use crate::links::LinkReferences;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:</[a-zA-Z][0-9A-Za-z_:-]*\s*>|<[a-zA-Z][0-9A-Za-z_-]*(?:\s+[a-zA-Z:_][0-9A-Za-z_.:-]*(?:\s*=\s*"[^"]*"|\s*=\s*'[^']*'|\s*=\s*[^\s"'=<>`]+)?)*?\s*/?>|<\?[\s\S]*?\?>|<![a-zA-Z]+\s[\s\S]*?>|<!\[CDATA\[[\s\S]*?\]\]>)"#,
    )
    .unwrap()
});

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^!?\[((?:\[(?:\\.|[^\[\]\\])*\]|\\.|`[^`]*`|[^\[\]\\`])*?)\]\(\s*(<(?:\\[<>]?|[^\s<>\\])*>|[^\s\x00-\x1f]*)(?:\s+("(?:\\"?|[^"\\])*"|'(?:\\'?|[^'\\])*'|\((?:\\\)?|[^)\\])*\)))?\s*\)"#,
    )
    .unwrap()
});

static REFLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^!?\[((?:\[(?:\\.|[^\[\]\\])*\]|\\.|`[^`]*`|[^\[\]\\`])*?)\]\[((?:\\[\[\]]?|[^\[\]\\])+)\]",
    )
    .unwrap()
});

static NOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^!?\[((?:\[[^\[\]]*\]|\\[\[\]]|[^\[\]])*)\](?:\[\])?").unwrap()
});

static AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<([a-zA-Z][a-zA-Z0-9+.-]{1,31}:[^\s\x00-\x1f<>]*|[a-zA-Z0-9.!#$%&'*+/=?_`{|}~-]+(@)[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+)>",
    )
    .unwrap()
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^((?:ftp|https?)://|www\.)(?:[a-zA-Z0-9\-]+\.?)+[^\s<]*|^[A-Za-z0-9._+-]+(@)[a-zA-Z0-9_-]+(?:\.[a-zA-Z0-9_-]*[a-zA-Z0-9])+",
    )
    .unwrap()
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Za-z0-9._+-]+@[a-zA-Z0-9_-]+(?:\.[a-zA-Z0-9_-]*[a-zA-Z0-9])+$").unwrap()
});

/// Spans whose content must not be mistaken for emphasis delimiters.
static BLOCK_SKIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*?\]\([^)]*?\)|`[^`]*?`|<[^>]*?>").unwrap());

/// Punctuation that lets emphasis open or close next to it.
pub(super) fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        '!' | '"' | '#' | '$' | '%' | '&' | '\'' | '(' | ')' | '*' | '+' | '-' | '.' | '/' | ':'
            | ';' | '<' | '=' | '>' | '?' | '@' | '[' | '^' | '_' | '{' | '|' | '}' | '~'
    )
}

fn is_email_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b".!#$%&'*+/=?_`{|}~-".contains(&b)
}

/// Copy of `text` with link, code and tag spans blanked out.
///
/// The copy has the same byte length as `text`, so offsets found in it
/// apply to the original.
pub(super) fn mask(text: &str, links: &LinkReferences) -> String {
    let mut masked = text.to_owned();
    if !links.is_empty() {
        let mut pos = 0;
        while pos < masked.len() {
            let rest = &masked[pos..];
            if !(rest.starts_with('[') || rest.starts_with("![")) {
                pos += rest.chars().next().map_or(1, char::len_utf8);
                continue;
            }
            match reference_search(rest) {
                Some(len) => {
                    let span = &rest[..len];
                    let label = &span[span.rfind('[').map_or(0, |i| i + 1)..len - 1];
                    if links.get(label).is_some() {
                        blank(&mut masked, pos, len);
                    }
                    pos += len;
                }
                None => pos += 1,
            }
        }
    }
    let spans: Vec<(usize, usize)> = BLOCK_SKIP
        .find_iter(&masked)
        .map(|m| (m.start(), m.len()))
        .collect();
    for (start, len) in spans {
        blank(&mut masked, start, len);
    }
    masked
}

fn blank(masked: &mut String, start: usize, len: usize) {
    let replacement = format!("[{}]", "a".repeat(len - 2));
    masked.replace_range(start..start + len, &replacement);
}

/// Length of a reference or shortcut link that is not an inline link.
fn reference_search(s: &str) -> Option<usize> {
    if let Some(caps) = REFLINK.captures(s)
        && !caps[2].trim().is_empty()
    {
        return Some(caps[0].len());
    }
    let caps = NOLINK.captures(s)?;
    if caps[1].trim().is_empty() {
        return None;
    }
    let label_end = caps.get(1)?.end();
    let mut len = caps[0].len();
    if s[len..].starts_with('(') {
        // only an empty `[]` suffix can be given back
        if len != label_end + 3 {
            return None;
        }
        len -= 2;
    }
    Some(len)
}

/// Backslash escape of an ASCII punctuation character.
pub(super) fn escape(s: &str) -> Option<char> {
    let mut chars = s.chars();
    if chars.next()? != '\\' {
        return None;
    }
    chars.next().filter(char::is_ascii_punctuation)
}

/// Raw inline HTML: a comment, tag, processing instruction, declaration or
/// CDATA section.
pub(super) fn tag(s: &str) -> Option<usize> {
    if let Some(body) = s.strip_prefix("<!--") {
        if body.starts_with('>') || body.starts_with("->") {
            return None;
        }
        return body.find("-->").map(|i| 4 + i + 3);
    }
    TAG.find(s).map(|m| m.end())
}

/// Inline link or image with its destination already unescaped.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct LinkMatch {
    pub len: usize,
    pub image: bool,
    pub text: String,
    pub href: String,
    pub title: Option<String>,
}

pub(super) fn inline_link(s: &str) -> Option<LinkMatch> {
    let caps = LINK.captures(s)?;
    let destination = caps.get(2)?;
    let mut len = caps.get(0)?.end();
    let mut href = destination.as_str();
    let mut title = caps.get(3).map(|t| {
        let t = t.as_str();
        &t[1..t.len() - 1]
    });

    if let Some(close) = unbalanced_paren(href) {
        len = destination.start() + close + 1;
        href = &href[..close];
        title = None;
    }

    let href = href.trim();
    let href = href
        .strip_prefix('<')
        .and_then(|h| h.strip_suffix('>'))
        .unwrap_or(href);

    Some(LinkMatch {
        len,
        image: s.starts_with('!'),
        text: unescape_brackets(&caps[1]),
        href: unescape_backslash(href).into_owned(),
        title: title.map(|t| unescape_backslash(t).into_owned()),
    })
}

/// Index of the first `)` that closes more parentheses than were opened.
fn unbalanced_paren(href: &str) -> Option<usize> {
    if !href.contains(')') {
        return None;
    }
    let bytes = href.as_bytes();
    let mut level = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'(' => level += 1,
            b')' => {
                level -= 1;
                if level < 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn unescape_brackets(text: &str) -> String {
    text.replace("\\[", "[").replace("\\]", "]")
}

/// `[text][label]`, `[label][]` or `[label]`, before the label is resolved.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct ReferenceMatch {
    pub len: usize,
    pub image: bool,
    pub text: String,
    pub label: String,
}

pub(super) fn reference_link(s: &str) -> Option<ReferenceMatch> {
    if let Some(caps) = REFLINK.captures(s)
        && !caps[2].trim().is_empty()
    {
        return Some(ReferenceMatch {
            len: caps[0].len(),
            image: s.starts_with('!'),
            text: unescape_brackets(&caps[1]),
            label: caps[2].to_owned(),
        });
    }
    let caps = NOLINK.captures(s)?;
    if caps[1].trim().is_empty() {
        return None;
    }
    Some(ReferenceMatch {
        len: caps[0].len(),
        image: s.starts_with('!'),
        text: unescape_brackets(&caps[1]),
        label: caps[1].to_owned(),
    })
}

/// Code span: returns its length and the content with edge spaces trimmed.
pub(super) fn codespan(s: &str) -> Option<(usize, String)> {
    let bytes = s.as_bytes();
    let run = bytes.iter().take_while(|&&b| b == b'`').count();
    if run == 0 || run >= bytes.len() {
        return None;
    }
    let mut q = run + s[run..].chars().next()?.len_utf8();
    while q < bytes.len() {
        if bytes[q] != b'`' {
            q += 1;
            continue;
        }
        let close = bytes[q..].iter().take_while(|&&b| b == b'`').count();
        if close == run {
            let text = s[run..q].replace('\n', " ");
            let trimmed = if text.contains(|c: char| c != ' ') && text.starts_with(' ') && text.ends_with(' ')
            {
                text[1..text.len() - 1].to_owned()
            } else {
                text
            };
            return Some((q + close, trimmed));
        }
        q += close;
    }
    None
}

/// Hard line break: two trailing spaces or a backslash before a newline
/// that is followed by more content.
pub(super) fn br(s: &str) -> Option<usize> {
    let spaces = s.bytes().take_while(|&b| b == b' ').count();
    let marker = if spaces >= 2 {
        spaces
    } else if s.starts_with('\\') {
        1
    } else {
        return None;
    };
    if !s[marker..].starts_with('\n') || s[marker + 1..].trim().is_empty() {
        return None;
    }
    Some(marker + 1)
}

/// Strikethrough: returns its length and the inner text.
pub(super) fn del(s: &str) -> Option<(usize, &str)> {
    let run = s.bytes().take_while(|&b| b == b'~').count();
    for open in (1..=run).rev() {
        let first = s[open..].chars().next();
        if first.is_none_or(char::is_whitespace) {
            continue;
        }
        let mut prev_solid = false;
        for (i, c) in s[open..].char_indices() {
            if c == '~' && prev_solid && i > 0 {
                let end = open + i;
                let close = s[end..].bytes().take_while(|&b| b == b'~').count();
                return Some((end + close, &s[open..end]));
            }
            prev_solid = !c.is_whitespace();
        }
    }
    None
}

/// Link produced from a bare or angle-bracketed URL or email address.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct AutoLink {
    pub len: usize,
    pub text: String,
    pub href: String,
}

pub(super) fn autolink(s: &str) -> Option<AutoLink> {
    let caps = AUTOLINK.captures(s)?;
    let text = caps[1].to_owned();
    let href = if caps.get(2).is_some() {
        format!("mailto:{text}")
    } else {
        text.clone()
    };
    Some(AutoLink {
        len: caps[0].len(),
        text,
        href,
    })
}

pub(super) fn url(s: &str) -> Option<AutoLink> {
    let caps = URL.captures(s)?;
    if caps.get(2).is_some() {
        let len = email_len(s, caps[0].len())?;
        let text = s[..len].to_owned();
        return Some(AutoLink {
            len,
            href: format!("mailto:{text}"),
            text,
        });
    }

    let mut len = caps[0].len();
    loop {
        let trimmed = backpedal(&s[..len]);
        if trimmed == len {
            break;
        }
        len = trimmed;
    }
    let text = s[..len].to_owned();
    let href = if &caps[1] == "www." {
        format!("http://{text}")
    } else {
        text.clone()
    };
    Some(AutoLink { len, text, href })
}

/// Shrink an email match until it is not followed by `-` or `_`.
fn email_len(s: &str, len: usize) -> Option<usize> {
    let followed = |end: usize| matches!(s.as_bytes().get(end), Some(b'-' | b'_'));
    if !followed(len) {
        return Some(len);
    }
    (1..len)
        .rev()
        .find(|&end| !followed(end) && EMAIL.is_match(&s[..end]))
}

/// Drop trailing punctuation and unbalanced parentheses from a bare URL.
fn backpedal(url: &str) -> usize {
    const TRAILING: &[u8] = b"?!.,:;*_~)";
    let bytes = url.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => match url[i..].find(')') {
                Some(close) => i += close + 1,
                None => break,
            },
            b'&' => {
                let rest = &url[i + 1..];
                let entity = rest.len() > 1
                    && rest.ends_with(';')
                    && rest[..rest.len() - 1].bytes().all(|b| b.is_ascii_alphanumeric());
                if entity {
                    break;
                }
                i += 1;
            }
            b if TRAILING.contains(&b) => {
                let run = bytes[i..].iter().take_while(|b| TRAILING.contains(b)).count();
                if i + run < bytes.len() {
                    i += run;
                } else if run > 1 {
                    i += run - 1;
                } else {
                    break;
                }
            }
            _ => {
                i += bytes[i..]
                    .iter()
                    .take_while(|&&b| !TRAILING.contains(&b) && b != b'(' && b != b'&')
                    .count();
            }
        }
    }
    i
}

/// For each byte: it starts a run of email characters ending at `@`.
pub(super) fn email_ahead(text: &str) -> Vec<bool> {
    let bytes = text.as_bytes();
    let mut ahead = vec![false; bytes.len() + 1];
    let mut run_reaches_at = false;
    for (i, &b) in bytes.iter().enumerate().rev() {
        if is_email_byte(b) {
            ahead[i] = run_reaches_at;
        } else {
            run_reaches_at = b == b'@';
        }
    }
    ahead
}

/// Plain text up to the next character that may start another rule.
///
/// `ahead` is the [`email_ahead`] table for `s`.
pub(super) fn text(s: &str, ahead: &[bool]) -> usize {
    let bytes = s.as_bytes();
    let first = if matches!(bytes.first(), Some(b'`' | b'~')) {
        bytes.iter().take_while(|&&b| b == b'`' || b == b'~').count()
    } else {
        s.chars().next().map_or(0, char::len_utf8)
    };
    if spaces_then_newline(&s[first..]) || ahead[first] {
        return first;
    }

    let mut q = first;
    while q < bytes.len() {
        let b = bytes[q];
        let prev_is_word = q > 0 && (bytes[q - 1].is_ascii_alphanumeric() || bytes[q - 1] == b'_');
        let rest = &s[q..];
        if matches!(b, b'\\' | b'<' | b'!' | b'[' | b'`' | b'*' | b'~')
            || (b == b'_' && !prev_is_word)
            || rest.starts_with("http://")
            || rest.starts_with("https://")
            || rest.starts_with("ftp://")
            || rest.starts_with("www.")
        {
            return q;
        }
        let width = rest.chars().next().map_or(1, char::len_utf8);
        let next = q + width;
        if (b != b' ' && spaces_then_newline(&s[next..])) || (!is_email_byte(b) && ahead[next]) {
            return next;
        }
        q = next;
    }
    q
}

fn spaces_then_newline(s: &str) -> bool {
    let spaces = s.bytes().take_while(|&b| b == b' ').count();
    spaces >= 2 && s[spaces..].starts_with('\n')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::links::LinkReference;

    #[test]
    fn test_inline_link_with_title() {
        let link = inline_link(r#"[docs](/guide "The \"Guide\"") rest"#).unwrap();

        assert_eq!(
            link,
            LinkMatch {
                len: 30,
                image: false,
                text: "docs".to_owned(),
                href: "/guide".to_owned(),
                title: Some(r#"The "Guide""#.to_owned()),
            }
        );
    }

    #[test]
    fn test_inline_link_balances_parentheses() {
        let link = inline_link("[a](foo(bar)) x").unwrap();

        assert_eq!(link.href, "foo(bar)");
        assert_eq!(link.len, 13);
    }

    #[test]
    fn test_inline_link_cuts_at_unbalanced_paren() {
        let link = inline_link("[a](b)c)").unwrap();

        assert_eq!(link.href, "b");
        assert_eq!(link.len, 6);
    }

    #[test]
    fn test_inline_image_angle_destination() {
        let link = inline_link("![alt \\[x\\]](<a.png>)").unwrap();

        assert!(link.image);
        assert_eq!(link.text, "alt [x]");
        assert_eq!(link.href, "a.png");
    }

    #[test]
    fn test_reference_link_forms() {
        assert_eq!(reference_link("[text][ref]").unwrap().label, "ref");
        assert_eq!(reference_link("[label][]").unwrap().label, "label");
        assert_eq!(reference_link("[label] x").unwrap().len, 7);
        assert_eq!(reference_link("[ ]"), None);
    }

    #[test]
    fn test_codespan() {
        assert_eq!(codespan("`code` x"), Some((6, "code".to_owned())));
        assert_eq!(codespan("`` a ` b `` x"), Some((11, "a ` b".to_owned())));
        assert_eq!(codespan("` `"), Some((3, " ".to_owned())));
        assert_eq!(codespan("`a\nb`"), Some((5, "a b".to_owned())));
        assert_eq!(codespan("``a`"), None);
    }

    #[test]
    fn test_br() {
        assert_eq!(br("  \nnext"), Some(3));
        assert_eq!(br("\\\nnext"), Some(2));
        assert_eq!(br("  \n"), None);
        assert_eq!(br(" \nnext"), None);
    }

    #[test]
    fn test_del() {
        assert_eq!(del("~~gone~~ x"), Some((8, "gone")));
        assert_eq!(del("~a b~"), Some((5, "a b")));
        assert_eq!(del("~~ a"), None);
        assert_eq!(del("~~~"), Some((3, "~")));
    }

    #[test]
    fn test_autolink() {
        let link = autolink("<https://example.com/a?b=1> x").unwrap();
        assert_eq!(link.href, "https://example.com/a?b=1");

        let mail = autolink("<me@example.com>").unwrap();
        assert_eq!(mail.href, "mailto:me@example.com");
        assert_eq!(mail.text, "me@example.com");
    }

    #[test]
    fn test_url_backpedals_trailing_punctuation() {
        assert_eq!(url("https://example.com/a.").unwrap().text, "https://example.com/a");
        assert_eq!(url("https://x.io/a_(b)), y").unwrap().text, "https://x.io/a_(b)");
        assert_eq!(url("https://x.io/?a&amp;").unwrap().text, "https://x.io/?a");
    }

    #[test]
    fn test_url_www_gets_scheme() {
        let link = url("www.example.com rest").unwrap();

        assert_eq!(link.text, "www.example.com");
        assert_eq!(link.href, "http://www.example.com");
    }

    #[test]
    fn test_url_email() {
        let link = url("help@example.com.").unwrap();

        assert_eq!(link.text, "help@example.com");
        assert_eq!(link.href, "mailto:help@example.com");
    }

    #[test]
    fn test_text_stops_before_specials() {
        let s = "plain *em*";
        assert_eq!(text(s, &email_ahead(s)), 6);

        let s = "snake_case _em_";
        assert_eq!(text(s, &email_ahead(s)), 11);

        let s = "see https://x.io";
        assert_eq!(text(s, &email_ahead(s)), 4);
    }

    #[test]
    fn test_text_stops_before_email_and_break() {
        let s = "mail me@x.io";
        assert_eq!(text(s, &email_ahead(s)), 5);

        let s = "line  \nnext";
        assert_eq!(text(s, &email_ahead(s)), 4);
    }

    #[test]
    fn test_mask_blanks_code_and_links() {
        let links = LinkReferences::new();

        assert_eq!(mask("a `*b*` [c](d) <e>", &links), "a [aaa] [aaaa] [a]");
    }

    #[test]
    fn test_mask_blanks_resolved_references_only() {
        let mut links = LinkReferences::new();
        links.define(
            "Ref",
            LinkReference {
                href: "/r".to_owned(),
                title: None,
            },
        );

        assert_eq!(mask("[x *y*][ref] [z][nope]", &links), "[aaaaaaaaaa] [z][nope]");
    }
}
