/*!
 * Inline scanning helpers.
 *
 * Splits a line's content into spans that must be kept verbatim (inline code,
 * images, link targets, bare URLs) and spans of prose that may be translated.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Inline code, images, links and bare URLs, in priority order
static INLINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?P<code>``.+?``|`[^`]+`)",
        r"|(?P<image>!\[[^\]]*\]\([^)]*\))",
        r"|(?P<link>\[(?P<anchor>[^\]]+)\](?P<target>\([^)]+\)))",
        r"|(?P<url>https?://[^\s)>\]]+)",
    ))
    .unwrap()
});

/// A piece of a line after inline scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    /// Emitted verbatim
    Keep(String),
    /// Sent for translation
    Translate(String),
}

impl InlineSpan {
    pub fn text(&self) -> &str {
        match self {
            Self::Keep(text) | Self::Translate(text) => text,
        }
    }

    pub fn is_translatable(&self) -> bool {
        matches!(self, Self::Translate(_))
    }
}

/// Split `content` into verbatim and translatable spans.
///
/// Link anchor text is translatable unless it is itself a URL or starts with a
/// back-tick. Prose needs at least one alphabetic character and must not start
/// with `@`. Whitespace around prose stays in `Keep` spans. Adjacent `Keep`
/// spans are merged, so concatenating all span texts gives back `content`.
pub fn split_inline(content: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in INLINE_REGEX.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        push_prose(&mut spans, &content[last..whole.start()]);

        match (caps.name("anchor"), caps.name("target")) {
            (Some(anchor), Some(target)) if is_translatable_anchor(anchor.as_str()) => {
                push_keep(&mut spans, "[");
                push_prose(&mut spans, anchor.as_str());
                push_keep(&mut spans, "]");
                push_keep(&mut spans, target.as_str());
            }
            _ => push_keep(&mut spans, whole.as_str()),
        }

        last = whole.end();
    }

    push_prose(&mut spans, &content[last..]);
    spans
}

fn is_translatable_anchor(anchor: &str) -> bool {
    let anchor = anchor.trim();
    !(anchor.starts_with("http://") || anchor.starts_with("https://") || anchor.starts_with('`'))
}

fn push_keep(spans: &mut Vec<InlineSpan>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(InlineSpan::Keep(previous)) = spans.last_mut() {
        previous.push_str(text);
    } else {
        spans.push(InlineSpan::Keep(text.to_string()));
    }
}

fn push_prose(spans: &mut Vec<InlineSpan>, text: &str) {
    if text.is_empty() {
        return;
    }

    let core = text.trim();
    if core.is_empty() || alphabetic_count(core) == 0 || core.starts_with('@') {
        push_keep(spans, text);
        return;
    }

    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];

    push_keep(spans, leading);
    spans.push(InlineSpan::Translate(core.to_string()));
    push_keep(spans, trailing);
}

/// Number of alphabetic characters in `text`
pub fn alphabetic_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphabetic()).count()
}

/// Emoji and pictographic symbols used to decorate titles and headings
pub fn is_decorative_glyph(c: char) -> bool {
    matches!(c,
        '\u{2190}'..='\u{21FF}'
        | '\u{2300}'..='\u{23FF}'
        | '\u{2460}'..='\u{24FF}'
        | '\u{25A0}'..='\u{27BF}'
        | '\u{2900}'..='\u{297F}'
        | '\u{2B00}'..='\u{2BFF}'
        | '\u{1F000}'..='\u{1FAFF}'
        | '\u{200D}'
        | '\u{20E3}'
        | '\u{FE0F}'
        | '\u{E0020}'..='\u{E007F}')
}

/// Split a leading cluster of decorative glyphs (plus the whitespace after it)
/// from the rest of `text`.
///
/// `split_leading_glyphs("🟢 Introduction")` gives `("🟢 ", "Introduction")`.
pub fn split_leading_glyphs(text: &str) -> (&str, &str) {
    let mut end = 0;
    let mut seen_glyph = false;

    for (index, c) in text.char_indices() {
        if is_decorative_glyph(c) {
            seen_glyph = true;
        } else if !(seen_glyph && c.is_whitespace()) {
            break;
        }
        end = index + c.len_utf8();
    }

    if !seen_glyph {
        return ("", text);
    }
    text.split_at(end)
}
