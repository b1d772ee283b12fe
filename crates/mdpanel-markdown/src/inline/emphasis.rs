//! Strong and emphasis delimiter matching.
//!
//! Closers are searched in the masked text so that delimiters inside code
//! spans, links and tags never pair up with the opener. A candidate closer
//! is accepted only if the span between it and the opener decomposes into
//! plain characters, escaped delimiters, `__..__` runs and balanced inner
//! delimiter pairs.

use super::rules::is_punctuation;

/// Length of a `**strong**` or `__strong__` span at the start of `source`.
pub(super) fn strong(source: &str, masked: &str, prev: Option<char>) -> Option<usize> {
    let delim = if source.starts_with("**") {
        let next = source[2..].chars().next();
        if next.is_some_and(char::is_whitespace) || !opens_after(next, prev) {
            return None;
        }
        b'*'
    } else if source.starts_with("__") {
        b'_'
    } else {
        return None;
    };
    find_span(masked, delim, 2)
}

/// Length of a `*em*` or `_em_` span at the start of `source`.
pub(super) fn em(source: &str, masked: &str, prev: Option<char>) -> Option<usize> {
    let delim = if source.starts_with('*') {
        let next = source[1..].chars().next();
        if next.is_some_and(|c| c == '*' || c.is_whitespace()) || !opens_after(next, prev) {
            return None;
        }
        b'*'
    } else if source.starts_with('_') {
        b'_'
    } else {
        return None;
    };
    find_span(masked, delim, 1)
}

/// An asterisk opener followed by punctuation needs punctuation, whitespace
/// or nothing before it.
fn opens_after(next: Option<char>, prev: Option<char>) -> bool {
    if !next.is_some_and(is_punctuation) {
        return true;
    }
    prev.is_none_or(|c| c.is_whitespace() || is_punctuation(c))
}

fn find_span(masked: &str, delim: u8, width: usize) -> Option<usize> {
    let mut from = 0;
    while let Some(end) = find_closer(masked, from, delim, width) {
        if balanced(&masked[..end], delim, width) {
            return Some(end);
        }
        from = end;
    }
    None
}

/// End of the next closing delimiter run whose preceding character starts
/// at or after `from`.
fn find_closer(masked: &str, from: usize, delim: u8, width: usize) -> Option<usize> {
    let bytes = masked.as_bytes();
    for (p, c) in masked[from..].char_indices() {
        let run_start = from + p + c.len_utf8();
        let run_end = run_start + width;
        if run_end > bytes.len() || !bytes[run_start..run_end].iter().all(|&b| b == delim) {
            continue;
        }
        if bytes.get(run_end) == Some(&delim) || c.is_whitespace() {
            continue;
        }
        let next = masked[run_end..].chars().next();
        let closes = if delim == b'*' {
            !is_punctuation(c) || next.is_none_or(|n| is_punctuation(n) || n.is_whitespace())
        } else {
            next.is_none_or(|n| is_punctuation(n) || n.is_whitespace())
        };
        if closes {
            return Some(run_end);
        }
    }
    None
}

/// Whether `span` (opener through closer) has well-formed content.
fn balanced(span: &str, delim: u8, width: usize) -> bool {
    let bytes = span.as_bytes();
    if bytes.len() < 2 * width + 1 {
        return false;
    }
    let content = &bytes[width..bytes.len() - width];
    if delim == b'_' {
        let first = span[width..].chars().next();
        if first.is_none_or(char::is_whitespace) || (width == 1 && content[0] == b'_') {
            return false;
        }
    }
    decomposes(content, delim, width)
}

fn decomposes(content: &[u8], delim: u8, width: usize) -> bool {
    let n = content.len();
    let mut reach = vec![false; n + 1];
    reach[0] = true;
    let mut ends = Vec::new();
    for i in 0..n {
        if !reach[i] {
            continue;
        }
        ends.clear();
        simple_units(content, i, delim, width, &mut ends);
        if content[i] == delim {
            inner_pairs(content, i + 1, delim, width, &mut ends);
        }
        for &end in &ends {
            reach[end] = true;
        }
    }
    reach[n]
}

/// Ends of single units at `i`: a `__..__` run, an escaped delimiter, any
/// other non-delimiter byte, or inside `__strong__` a lone intraword `_`.
fn simple_units(content: &[u8], i: usize, delim: u8, width: usize, ends: &mut Vec<usize>) {
    if let Some(end) = underscore_run(content, i) {
        ends.push(end);
        return;
    }
    if content[i] == b'\\' && content.get(i + 1) == Some(&delim) {
        ends.push(i + 2);
    }
    if content[i] != delim || (width == 2 && intraword_underscore(content, i)) {
        ends.push(i + 1);
    }
}

/// A single `_` with a word character on both sides, as in `snake_case`.
fn intraword_underscore(content: &[u8], i: usize) -> bool {
    let word = |b: Option<&u8>| b.is_some_and(|b| b.is_ascii_alphanumeric() || !b.is_ascii());
    content[i] == b'_' && i > 0 && word(content.get(i - 1)) && word(content.get(i + 1))
}

/// Ends of `delim units* delim` pairs whose opener sits just before `start`.
fn inner_pairs(content: &[u8], start: usize, delim: u8, width: usize, ends: &mut Vec<usize>) {
    let n = content.len();
    let mut reach = vec![false; n + 1];
    reach[start] = true;
    let mut furthest = start;
    let mut units = Vec::new();
    for pos in start..n {
        if pos > furthest {
            break;
        }
        if !reach[pos] {
            continue;
        }
        if content[pos] == delim {
            ends.push(pos + 1);
        }
        units.clear();
        simple_units(content, pos, delim, width, &mut units);
        for &end in &units {
            reach[end] = true;
            furthest = furthest.max(end);
        }
    }
}

/// `__` followed by non-underscores and a closing `__`.
fn underscore_run(content: &[u8], i: usize) -> Option<usize> {
    if !content[i..].starts_with(b"__") {
        return None;
    }
    let close = i + 2 + content[i + 2..].iter().position(|&b| b == b'_')?;
    (content.get(close + 1) == Some(&b'_')).then_some(close + 2)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn strong_len(s: &str) -> Option<usize> {
        strong(s, s, None)
    }

    fn em_len(s: &str) -> Option<usize> {
        em(s, s, None)
    }

    #[test]
    fn test_strong_simple() {
        assert_eq!(strong_len("**bold** rest"), Some(8));
        assert_eq!(strong_len("__bold__ rest"), Some(8));
    }

    #[test]
    fn test_strong_with_nested_em() {
        assert_eq!(strong_len("**bold *and* nested**"), Some(21));
    }

    #[test]
    fn test_strong_with_intraword_underscore() {
        assert_eq!(strong_len("__snake_case__"), Some(14));
        assert_eq!(strong_len("__a_b_c__ rest"), Some(9));
        assert_eq!(strong_len("__snake _case__"), None);
    }

    #[test]
    fn test_strong_rejects_leading_space() {
        assert_eq!(strong_len("** bold**"), None);
        assert_eq!(strong_len("__ bold__"), None);
    }

    #[test]
    fn test_strong_needs_closer() {
        assert_eq!(strong_len("**open"), None);
    }

    #[test]
    fn test_em_simple() {
        assert_eq!(em_len("*it* x"), Some(4));
        assert_eq!(em_len("_it_ x"), Some(4));
    }

    #[test]
    fn test_em_rejects_double_or_space() {
        assert_eq!(em_len("**x**"), None);
        assert_eq!(em_len("* x*"), None);
        assert_eq!(em_len("__x__"), None);
    }

    #[test]
    fn test_intraword_underscore_does_not_pair() {
        assert_eq!(em_len("_snake_case_"), None);
        assert_eq!(em_len("_snake_case_ x"), None);
    }

    #[test]
    fn test_escaped_delimiter_inside() {
        assert_eq!(em_len(r"*a\**"), Some(5));
    }

    #[test]
    fn test_punctuation_opener_needs_boundary() {
        assert_eq!(strong("**(x)**", "**(x)**", Some('a')), None);
        assert_eq!(strong("**(x)**", "**(x)**", Some(' ')), Some(7));
    }

    #[test]
    fn test_masked_delimiters_are_ignored() {
        let source = "*a `*` b*";
        let masked = "*a [a] b*";

        assert_eq!(em(source, masked, None), Some(9));
    }
}
