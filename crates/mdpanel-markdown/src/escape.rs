//! HTML escaping helpers.
//!
//! Two flavors exist: attribute escaping encodes every special character,
//! content escaping leaves existing entity references intact so that
//! `&copy;` written in markdown still renders as an entity.

use std::borrow::Cow;

const SPECIAL: [char; 5] = ['&', '<', '>', '"', '\''];

fn replacement(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape all five HTML special characters.
///
/// Used for code content, where entities must show up literally.
pub fn escape_for_attribute(text: &str) -> Cow<'_, str> {
    if !text.contains(SPECIAL) {
        return Cow::Borrowed(text);
    }
    let mut result = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match replacement(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape HTML special characters, keeping `&` that starts an entity reference.
pub fn escape_for_content(text: &str) -> Cow<'_, str> {
    let needs_escape = text.char_indices().any(|(i, c)| match c {
        '<' | '>' | '"' | '\'' => true,
        '&' => !starts_entity(&text[i..]),
        _ => false,
    });
    if !needs_escape {
        return Cow::Borrowed(text);
    }
    let mut result = String::with_capacity(text.len() + 16);
    for (i, c) in text.char_indices() {
        match replacement(c) {
            Some(_) if c == '&' && starts_entity(&text[i..]) => result.push('&'),
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Whether `s` (starting at `&`) continues as `#?\w+;`.
fn starts_entity(s: &str) -> bool {
    let rest = &s[1..];
    let rest = rest.strip_prefix('#').unwrap_or(rest);
    let word = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    word > 0 && rest.as_bytes().get(word) == Some(&b';')
}

/// Remove backslashes that escape ASCII punctuation.
pub fn unescape_backslash(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && next.is_ascii_punctuation()
        {
            result.push(next);
            chars.next();
            continue;
        }
        result.push(c);
    }
    Cow::Owned(result)
}

/// Decode the five escaped characters and numeric character references.
///
/// Other named references are kept as written.
pub fn unescape_html(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];
        if let Some((c, len)) = decode_reference(rest) {
            result.push(c);
            rest = &rest[len..];
        } else {
            result.push('&');
            rest = &rest[1..];
        }
    }
    result.push_str(rest);
    Cow::Owned(result)
}

/// Character and length of the reference at the start of `s`.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    let end = s.find(';')?;
    let c = match &s[1..end] {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        name => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((c, end + 1))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_escape_for_attribute() {
        assert_eq!(
            escape_for_attribute(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_for_attribute_encodes_entities() {
        assert_eq!(escape_for_attribute("&copy;"), "&amp;copy;");
    }

    #[test]
    fn test_escape_borrows_clean_input() {
        assert!(matches!(escape_for_attribute("plain"), Cow::Borrowed(_)));
        assert!(matches!(escape_for_content("a &amp; b"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_for_content_keeps_entities() {
        assert_eq!(escape_for_content("&copy; &#169; &x27 a & b"), "&copy; &#169; &amp;x27 a &amp; b");
        assert_eq!(escape_for_content("&#;"), "&amp;#;");
        assert_eq!(escape_for_content("<b>"), "&lt;b&gt;");
    }

    #[test]
    fn test_unescape_backslash() {
        assert_eq!(unescape_backslash(r"\*not emphasis\*"), "*not emphasis*");
        assert_eq!(unescape_backslash(r"C:\path\to"), r"C:\path\to");
        assert_eq!(unescape_backslash(r"\\"), r"\");
        assert_eq!(unescape_backslash(r"trailing\"), r"trailing\");
    }

    #[test]
    fn test_unescape_html_reverses_escaping() {
        let original = r#"<a href="x">Tom & 'Jerry'</a>"#;

        assert_eq!(unescape_html(&escape_for_attribute(original)), original);
    }

    #[test]
    fn test_unescape_html_numeric_and_unknown() {
        assert_eq!(unescape_html("&#169; &#xA9; &copy; & x;"), "\u{a9} \u{a9} &copy; & x;");
        assert_eq!(unescape_html("&#xZZ;"), "&#xZZ;");
    }
}
