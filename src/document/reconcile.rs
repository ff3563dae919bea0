/*!
 * Placeholder template and reconciliation.
 *
 * Segmentation replaces every translation unit with a placeholder token in a
 * copy of the document. Once all translations are known the tokens are
 * substituted in one left-to-right pass, so translated text is never scanned
 * for tokens itself.
 *
 * Line layout is shared by both directions: `layout_line` puts any slot text
 * (a token, a recomposed list of tokens, or a translation) back into the
 * structure of the original line.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::document::model::{join_lines, LineEnding, TranslationUnit, UnitContext, UnitKind};
use crate::document::segmenter::skip_tag;
use crate::errors::DocumentError;

/// Opening bracket of a placeholder token (private use area)
pub const PLACEHOLDER_OPEN: char = '\u{E000}';
/// Closing bracket of a placeholder token (private use area)
pub const PLACEHOLDER_CLOSE: char = '\u{E001}';

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x{E000}([0-9]+)\x{E001}").unwrap());

static TITLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(.*?\btitle:\s*")((?:[^"\\]|\\.)*)(".*)$"#).unwrap());

static HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*#{1,6}\s+)(.*?)(\s*\{#[^}]*\})?(\s*)$").unwrap());

static LIST_ITEM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*(?:[-*+]|\d+[.)])\s+)(.*?)(\s*)$").unwrap());

static COMPONENT_OPEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<([A-Z][A-Za-z0-9_.]*)").unwrap());

static COMPONENT_CLOSE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(.*?)(\s*)(</([A-Z][A-Za-z0-9_.]*)>\s*)$").unwrap());

static PLAIN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)(.*?)(\s*)$").unwrap());

/// Build the placeholder token for a unit id
pub fn placeholder(id: usize) -> String {
    format!("{}{}{}", PLACEHOLDER_OPEN, id, PLACEHOLDER_CLOSE)
}

/// Whether `text` contains either placeholder bracket character
pub fn contains_reserved(text: &str) -> bool {
    text.contains(PLACEHOLDER_OPEN) || text.contains(PLACEHOLDER_CLOSE)
}

/// A line cut into the structure kept from the original and the translatable body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineParts<'a> {
    pub prefix: &'a str,
    pub body: &'a str,
    pub suffix: String,
}

/// Cut `line` according to the layout of `kind`.
///
/// Returns `None` when the line does not have the shape `kind` expects.
pub fn split_line(line: &str, kind: UnitKind) -> Option<LineParts<'_>> {
    match kind {
        UnitKind::Title => {
            let caps = TITLE_REGEX.captures(line)?;
            Some(LineParts {
                prefix: group(&caps, 1, line),
                body: group(&caps, 2, line),
                suffix: caps[3].to_string(),
            })
        }
        UnitKind::Header => {
            let caps = HEADER_REGEX.captures(line)?;
            let anchor = caps.get(3).map_or("", |m| m.as_str());
            Some(LineParts {
                prefix: group(&caps, 1, line),
                body: group(&caps, 2, line),
                suffix: format!("{}{}", anchor, &caps[4]),
            })
        }
        UnitKind::ListItem => {
            let caps = LIST_ITEM_REGEX.captures(line)?;
            Some(LineParts {
                prefix: group(&caps, 1, line),
                body: group(&caps, 2, line),
                suffix: caps[3].to_string(),
            })
        }
        UnitKind::ComponentInline => {
            let open = COMPONENT_OPEN_REGEX.captures(line)?;
            let name = open.get(1)?;
            let after_name = &line[name.end()..];
            if !after_name.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/') {
                return None;
            }

            let tag_end = opening_tag_end(line, name.end())?;
            if line[..tag_end].ends_with('/') {
                return None;
            }

            let rest = &line[tag_end + 1..];
            let caps = COMPONENT_CLOSE_REGEX.captures(rest)?;
            if name.as_str() != &caps[5] {
                return None;
            }
            let body_start = tag_end + 1 + caps.get(1).map_or(0, |m| m.end());
            Some(LineParts {
                prefix: &line[..body_start],
                body: group(&caps, 2, rest),
                suffix: format!("{}{}", &caps[3], &caps[4]),
            })
        }
        UnitKind::Paragraph | UnitKind::ParagraphWithInlineMarkup | UnitKind::CodeProse => {
            let caps = PLAIN_REGEX.captures(line)?;
            Some(LineParts {
                prefix: group(&caps, 1, line),
                body: group(&caps, 2, line),
                suffix: caps[3].to_string(),
            })
        }
    }
}

/// Byte offset of the `>` closing the tag whose attributes start at byte `from`
fn opening_tag_end(line: &str, from: usize) -> Option<usize> {
    let chars: Vec<char> = line.chars().collect();
    let end = skip_tag(&chars, line[..from].chars().count())?;
    line.char_indices().nth(end).map(|(offset, _)| offset)
}

fn group<'a>(caps: &Captures<'a>, index: usize, line: &'a str) -> &'a str {
    caps.get(index).map_or(&line[..0], |m| m.as_str())
}

/// Prepare a translated fragment for insertion into a line of `kind`
pub fn render_fragment(kind: UnitKind, translated: &str) -> String {
    let single_line = translated.trim().replace("\r\n", " ").replace('\n', " ");
    match kind {
        UnitKind::Title => escape_title(&single_line),
        _ => single_line,
    }
}

/// Characters that may follow `\` in a double-quoted title, apart from `"`
const TITLE_ESCAPES: &str = "0abt\tnvfre /\\N_LPxuU";

/// Undo the quote escaping of a double-quoted title value.
///
/// Only `\"` is decoded. Every other escape pair, `\\` included, is kept as
/// written, so `escape_title` gives back the original value byte for byte.
pub fn unescape_title(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Escape text for a double-quoted title value.
///
/// Existing escape pairs such as `\t` or `\u00e9` are left alone; a bare
/// backslash and every `"` get escaped.
pub fn escape_title(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next) if TITLE_ESCAPES.contains(next) => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                _ => out.push_str("\\\\"),
            },
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Put `slot` in place of the translatable body of `original`.
///
/// The emoji prefix carried in `context` is reattached in front of the slot;
/// everything else (indentation, bullet, heading marker, anchor, quotes,
/// component tags) is taken from the original line.
pub fn layout_line(
    original: &str,
    kind: UnitKind,
    context: Option<&UnitContext>,
    slot: &str,
) -> Option<String> {
    let parts = split_line(original, kind)?;
    let emoji = match context {
        Some(UnitContext::EmojiPrefix(prefix)) => prefix.as_str(),
        _ => "",
    };
    Some(format!("{}{}{}{}", parts.prefix, emoji, slot, parts.suffix))
}

/// Rebuild a whole-line unit's line around its translation
pub fn reconcile_line(
    original: &str,
    kind: UnitKind,
    context: Option<&UnitContext>,
    translated: &str,
) -> Option<String> {
    layout_line(original, kind, context, &render_fragment(kind, translated))
}

/// A document with every translation unit replaced by its placeholder token
#[derive(Debug, Clone)]
pub struct SegmentedDocument {
    template: Vec<String>,
    units: Vec<TranslationUnit>,
    terminators: Vec<LineEnding>,
}

impl SegmentedDocument {
    /// Template whose lines all end with `line_ending`
    pub fn new(template: Vec<String>, units: Vec<TranslationUnit>, line_ending: LineEnding) -> Self {
        let terminators = vec![line_ending; template.len().saturating_sub(1)];
        Self {
            template,
            units,
            terminators,
        }
    }

    /// Use a terminator per template line, as recorded by `Document::parse`
    pub fn with_terminators(mut self, terminators: Vec<LineEnding>) -> Self {
        self.terminators = terminators;
        self
    }

    pub fn template(&self) -> &[String] {
        &self.template
    }

    pub fn units(&self) -> &[TranslationUnit] {
        &self.units
    }

    /// Texts to translate, in unit order
    pub fn texts(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.raw_text.clone()).collect()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Substitute `translations` (indexed by unit id) into the template.
    ///
    /// Fails without producing any text if the number of translations does not
    /// match the number of units, or if a token is unknown, repeated or absent.
    pub fn reconcile(&self, translations: &[String]) -> Result<String, DocumentError> {
        if translations.len() != self.units.len() {
            return Err(DocumentError::TranslationCountMismatch {
                expected: self.units.len(),
                actual: translations.len(),
            });
        }

        let mut seen = vec![false; self.units.len()];
        let mut failure: Option<DocumentError> = None;
        let mut lines = Vec::with_capacity(self.template.len());

        for line in &self.template {
            let rebuilt = PLACEHOLDER_REGEX.replace_all(line, |caps: &Captures| {
                let id = match caps[1].parse::<usize>() {
                    Ok(id) if id < self.units.len() => id,
                    Ok(id) => {
                        failure.get_or_insert(DocumentError::UnknownPlaceholder(id));
                        return String::new();
                    }
                    Err(_) => {
                        failure.get_or_insert(DocumentError::UnknownPlaceholder(usize::MAX));
                        return String::new();
                    }
                };

                if seen[id] {
                    failure.get_or_insert(DocumentError::DuplicatePlaceholder(id));
                    return String::new();
                }
                seen[id] = true;

                render_fragment(self.units[id].kind, &translations[id])
            });
            lines.push(rebuilt.into_owned());
        }

        if let Some(error) = failure {
            return Err(error);
        }
        if let Some(id) = seen.iter().position(|done| !done) {
            return Err(DocumentError::MissingPlaceholder(id));
        }

        Ok(join_lines(&lines, &self.terminators))
    }
}
