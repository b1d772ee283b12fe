//! Heading anchor generation.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&(#[0-9]+|#x[0-9a-f]+|[0-9a-z_]+);?").unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<[!/a-z].*?>").unwrap());

static PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"[\u{2000}-\u{206F}\u{2E00}-\u{2E7F}\\'!"#$%&()*+,./:;<=>?@\[\]^`{|}~]"##)
        .unwrap()
});

/// Slugs handed out during a single render.
///
/// Repeated headings get `-1`, `-2`, ... suffixes, skipping any suffixed
/// form that an earlier heading already produced on its own.
#[derive(Debug, Default)]
pub struct SlugTable {
    seen: HashMap<String, usize>,
}

impl SlugTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a unique slug for the plain text of a heading.
    pub fn slug(&mut self, text: &str) -> String {
        let value = slugify(text);
        let mut slug = value.clone();
        let mut count = 0;
        if let Some(&previous) = self.seen.get(&value) {
            count = previous;
            loop {
                count += 1;
                slug = format!("{value}-{count}");
                if !self.seen.contains_key(&slug) {
                    break;
                }
            }
        }
        self.seen.insert(value, count);
        self.seen.insert(slug.clone(), 0);
        slug
    }
}

/// Convert heading text to its base slug, without uniqueness suffixes.
pub fn slugify(text: &str) -> String {
    let decoded = ENTITY_RE.replace_all(text, |caps: &Captures| decode_entity(&caps[1]));
    let lowered = decoded.to_lowercase();
    let without_tags = TAG_RE.replace_all(lowered.trim(), "");
    let stripped = PUNCTUATION_RE.replace_all(&without_tags, "");
    stripped
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

fn decode_entity(name: &str) -> String {
    let name = name.to_ascii_lowercase();
    if name == "colon" {
        return ":".to_owned();
    }
    let Some(number) = name.strip_prefix('#') else {
        return String::new();
    };
    let code = match number.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => number.parse().ok(),
    };
    code.and_then(char::from_u32).map(String::from).unwrap_or_default()
}
