/*!
 * Line segmentation state machine.
 *
 * Every line of a document is classified in a single pass. The automaton state
 * (front matter, code fence, export block, component block or plain Markdown)
 * is an explicit value and `Segmenter::step` is a pure transition, so the
 * classifier can be exercised without collecting any units.
 *
 * `Segmenter::segment` runs the automaton over a whole document and produces
 * a `SegmentedDocument`: the translation units plus a template in which each
 * unit is replaced by its placeholder token.
 */

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::SegmenterConfig;
use crate::document::inline::{alphabetic_count, split_inline, split_leading_glyphs, InlineSpan};
use crate::document::model::{Document, TranslationUnit, UnitContext, UnitKind};
use crate::document::reconcile::{
    contains_reserved, layout_line, placeholder, split_line, unescape_title, SegmentedDocument,
};
use crate::errors::DocumentError;

static TAG_START_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*</?([A-Za-z][A-Za-z0-9_.\-]*)").unwrap());

static TITLE_FIELD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\btitle:\s*"(?:[^"\\]|\\.)*""#).unwrap());

/// HTML elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Automaton state between two lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmenterState {
    /// Plain Markdown
    #[default]
    Default,
    /// Between the opening and closing `---` of the front matter
    Frontmatter,
    /// Inside a fenced code block; `prose` when its language tag marks prose
    CodeFence { prose: bool },
    /// Inside a multi-line `export` declaration, with its open brace count
    ExportBlock { depth: i32 },
    /// Inside a multi-line component or HTML element, with its open tag count
    ComponentBlock { depth: i32 },
}

/// What a line contributes to the translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Copied verbatim
    PassThrough,
    /// Carries a double-quoted `title:` value
    Title,
    /// Heading with translatable text
    Header,
    /// List item with enough prose after the bullet
    ListItem,
    /// Prose paragraph line
    Paragraph { inline_markup: bool },
    /// Non-empty line inside a prose fence
    CodeProse,
    /// Single-line `<Name>text</Name>` with translatable inner text
    ComponentInline(String),
}

/// Line classifier and unit collector
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Classify `line` (at 0-based `index`) given the state left by the previous
    /// line, returning the state for the next line.
    pub fn step(&self, state: SegmenterState, index: usize, line: &str) -> (SegmenterState, LineClass) {
        let trimmed = line.trim();

        match state {
            SegmenterState::Frontmatter => {
                if trimmed == "---" {
                    (SegmenterState::Default, LineClass::PassThrough)
                } else if trimmed.starts_with("title:") && TITLE_FIELD_REGEX.is_match(line) {
                    (state, LineClass::Title)
                } else {
                    (state, LineClass::PassThrough)
                }
            }

            SegmenterState::CodeFence { prose } => {
                if trimmed.starts_with("```") {
                    (SegmenterState::Default, LineClass::PassThrough)
                } else if prose && !trimmed.is_empty() {
                    (state, LineClass::CodeProse)
                } else {
                    (state, LineClass::PassThrough)
                }
            }

            SegmenterState::ExportBlock { depth } => {
                let depth = depth + brace_delta(line);
                let class = title_class(line);
                if depth <= 0 {
                    (SegmenterState::Default, class)
                } else {
                    (SegmenterState::ExportBlock { depth }, class)
                }
            }

            SegmenterState::ComponentBlock { depth } => {
                let depth = depth + tag_delta(line);
                if depth <= 0 {
                    (SegmenterState::Default, LineClass::PassThrough)
                } else {
                    (SegmenterState::ComponentBlock { depth }, LineClass::PassThrough)
                }
            }

            SegmenterState::Default => self.step_default(index, line, trimmed),
        }
    }

    fn step_default(&self, index: usize, line: &str, trimmed: &str) -> (SegmenterState, LineClass) {
        let pass = (SegmenterState::Default, LineClass::PassThrough);

        if trimmed.is_empty() {
            return pass;
        }

        if index == 0 && trimmed == "---" {
            return (SegmenterState::Frontmatter, LineClass::PassThrough);
        }

        if trimmed.starts_with("```") {
            let prose = fence_language(trimmed)
                .map(|lang| self.config.prose_languages.iter().any(|p| p.eq_ignore_ascii_case(&lang)))
                .unwrap_or(false);
            return (SegmenterState::CodeFence { prose }, LineClass::PassThrough);
        }

        if self.config.export_blocks && is_keyword_line(trimmed, "export") {
            let depth = brace_delta(line);
            let class = title_class(line);
            if depth > 0 {
                return (SegmenterState::ExportBlock { depth }, class);
            }
            return (SegmenterState::Default, class);
        }

        if is_keyword_line(trimmed, "import") || trimmed.starts_with("<!--") {
            return pass;
        }

        if let Some(caps) = TAG_START_REGEX.captures(trimmed) {
            let name = &caps[1];
            if let Some(class) = self.component_inline_class(name, line) {
                return (SegmenterState::Default, class);
            }
            let depth = tag_delta(line);
            if depth > 0 {
                return (SegmenterState::ComponentBlock { depth }, LineClass::PassThrough);
            }
            return pass;
        }

        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            return pass;
        }

        if trimmed.starts_with('#') {
            if let Some(parts) = split_line(line, UnitKind::Header) {
                let (_, text) = split_leading_glyphs(parts.body);
                if alphabetic_count(text) > 0 {
                    return (SegmenterState::Default, LineClass::Header);
                }
                return pass;
            }
        }

        if let Some(parts) = split_line(line, UnitKind::ListItem) {
            if self.prose_alpha_count(parts.body) >= self.config.min_alpha_chars {
                return (SegmenterState::Default, LineClass::ListItem);
            }
            return pass;
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return pass;
        }

        if self.prose_alpha_count(trimmed) >= self.config.min_alpha_chars {
            let inline_markup = trimmed.contains('<') || trimmed.contains('>');
            return (SegmenterState::Default, LineClass::Paragraph { inline_markup });
        }

        pass
    }

    /// Letters counted against the alphabetic threshold.
    ///
    /// Without link-aware splitting the threshold is the only guard against
    /// code-only and link-only lines, so inline code, link targets and URL
    /// anchors are left out of the count.
    fn prose_alpha_count(&self, text: &str) -> usize {
        if self.config.link_aware {
            return alphabetic_count(text);
        }
        split_inline(text)
            .iter()
            .filter(|span| span.is_translatable())
            .map(|span| alphabetic_count(span.text()))
            .sum()
    }

    fn component_inline_class(&self, name: &str, line: &str) -> Option<LineClass> {
        if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        if self.config.skip_components.iter().any(|skip| skip == name) {
            return None;
        }

        let parts = split_line(line, UnitKind::ComponentInline)?;
        let inner = parts.body;
        if inner.chars().count() < self.config.min_component_inline_len
            || alphabetic_count(inner) == 0
            || inner.contains('<')
        {
            return None;
        }

        Some(LineClass::ComponentInline(name.to_string()))
    }

    /// Segment a whole document into units and a placeholder template
    pub fn segment(&self, document: &Document) -> Result<SegmentedDocument, DocumentError> {
        if let Some(index) = document.lines().iter().position(|line| contains_reserved(line)) {
            return Err(DocumentError::ReservedCharacters { line: index + 1 });
        }

        let mut state = SegmenterState::default();
        let mut units: Vec<TranslationUnit> = Vec::new();
        let mut template = Vec::with_capacity(document.len());

        for (index, line) in document.lines().iter().enumerate() {
            let (next, class) = self.step(state, index, line);
            trace!("line {} {:?} -> {:?}", index + 1, class, next);

            let rebuilt = match self.collect(&class, index, line, units.len()) {
                Some((slot_line, mut new_units)) => {
                    units.append(&mut new_units);
                    slot_line
                }
                None => line.clone(),
            };

            template.push(rebuilt);
            state = next;
        }

        Ok(SegmentedDocument::new(template, units, document.line_ending())
            .with_terminators(document.terminators().to_vec()))
    }

    /// Build the template line and units for one classified line.
    ///
    /// `None` means the line passes through after all.
    fn collect(
        &self,
        class: &LineClass,
        line_index: usize,
        line: &str,
        first_id: usize,
    ) -> Option<(String, Vec<TranslationUnit>)> {
        let (kind, context, body, split_links) = match class {
            LineClass::PassThrough => return None,
            LineClass::Title => {
                let parts = split_line(line, UnitKind::Title)?;
                let value = unescape_title(parts.body);
                let (emoji, text) = split_leading_glyphs(value.trim());
                let context = emoji_context(emoji);
                (UnitKind::Title, context, text.trim().to_string(), false)
            }
            LineClass::Header => {
                let parts = split_line(line, UnitKind::Header)?;
                let (emoji, text) = split_leading_glyphs(parts.body);
                (UnitKind::Header, emoji_context(emoji), text.to_string(), true)
            }
            LineClass::ListItem => {
                let parts = split_line(line, UnitKind::ListItem)?;
                let bullet = UnitContext::Bullet(parts.prefix.trim_start().to_string());
                (UnitKind::ListItem, Some(bullet), parts.body.to_string(), true)
            }
            LineClass::Paragraph { inline_markup } => {
                let kind = if *inline_markup {
                    UnitKind::ParagraphWithInlineMarkup
                } else {
                    UnitKind::Paragraph
                };
                let parts = split_line(line, kind)?;
                (kind, None, parts.body.to_string(), true)
            }
            LineClass::CodeProse => {
                let parts = split_line(line, UnitKind::CodeProse)?;
                (UnitKind::CodeProse, None, parts.body.to_string(), false)
            }
            LineClass::ComponentInline(name) => {
                let parts = split_line(line, UnitKind::ComponentInline)?;
                let context = UnitContext::Component(name.clone());
                (UnitKind::ComponentInline, Some(context), parts.body.to_string(), false)
            }
        };

        if alphabetic_count(&body) == 0 {
            return None;
        }

        let whole_line = |id: usize| TranslationUnit {
            id,
            line_index,
            segment: None,
            raw_text: body.clone(),
            kind,
            context: context.clone(),
        };

        if !(split_links && self.config.link_aware) {
            let slot = placeholder(first_id);
            let rebuilt = layout_line(line, kind, context.as_ref(), &slot)?;
            return Some((rebuilt, vec![whole_line(first_id)]));
        }

        let spans = split_inline(&body);
        let translatable = spans.iter().filter(|span| span.is_translatable()).count();
        if translatable == 0 {
            return None;
        }
        if spans.len() == 1 {
            let slot = placeholder(first_id);
            let rebuilt = layout_line(line, kind, context.as_ref(), &slot)?;
            return Some((rebuilt, vec![whole_line(first_id)]));
        }

        let mut units = Vec::with_capacity(translatable);
        let mut slot = String::with_capacity(body.len());
        for span in spans {
            match span {
                InlineSpan::Keep(text) => slot.push_str(&text),
                InlineSpan::Translate(text) => {
                    let id = first_id + units.len();
                    slot.push_str(&placeholder(id));
                    units.push(TranslationUnit {
                        id,
                        line_index,
                        segment: Some(units.len()),
                        raw_text: text,
                        kind,
                        context: context.clone(),
                    });
                }
            }
        }

        let rebuilt = layout_line(line, kind, context.as_ref(), &slot)?;
        Some((rebuilt, units))
    }
}

fn emoji_context(emoji: &str) -> Option<UnitContext> {
    if emoji.is_empty() {
        None
    } else {
        Some(UnitContext::EmojiPrefix(emoji.to_string()))
    }
}

fn title_class(line: &str) -> LineClass {
    if TITLE_FIELD_REGEX.is_match(line) {
        LineClass::Title
    } else {
        LineClass::PassThrough
    }
}

/// `true` when `trimmed` starts with `keyword` as a whole word
fn is_keyword_line(trimmed: &str, keyword: &str) -> bool {
    match trimmed.strip_prefix(keyword) {
        Some(rest) => rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '{'),
        None => false,
    }
}

/// Language tag of an opening code fence, lowercased
fn fence_language(trimmed: &str) -> Option<String> {
    trimmed
        .trim_start_matches('`')
        .split(|c: char| c.is_whitespace() || c == '{')
        .find(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
}

/// Net change in `{`/`}` nesting on a line
fn brace_delta(line: &str) -> i32 {
    line.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

/// Net change in element nesting on a line.
///
/// An opening tag counts +1 unless it is self-closing or a void element. An
/// opening tag whose `>` is not on this line counts +1; the `/>` that later
/// closes it counts -1. Closing tags count -1.
pub(crate) fn tag_delta(line: &str) -> i32 {
    let chars: Vec<char> = line.chars().collect();
    let mut depth = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '/' && chars.get(i + 1) == Some(&'>') {
            depth -= 1;
            i += 2;
            continue;
        }

        if c != '<' {
            i += 1;
            continue;
        }

        match chars.get(i + 1) {
            Some('/') => {
                depth -= 1;
                i = skip_tag(&chars, i + 2).map_or(chars.len(), |end| end + 1);
            }
            Some(next) if next.is_ascii_alphabetic() => {
                let name_start = i + 1;
                let mut name_end = name_start;
                while name_end < chars.len()
                    && (chars[name_end].is_ascii_alphanumeric() || matches!(chars[name_end], '_' | '.' | '-'))
                {
                    name_end += 1;
                }
                let name: String = chars[name_start..name_end].iter().collect();

                match skip_tag(&chars, name_end) {
                    Some(end) => {
                        let self_closing = end > 0 && chars[end - 1] == '/';
                        let void = VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str());
                        if !self_closing && !void {
                            depth += 1;
                        }
                        i = end + 1;
                    }
                    None => {
                        depth += 1;
                        i = chars.len();
                    }
                }
            }
            _ => i += 1,
        }
    }

    depth
}

/// Index of the `>` ending the tag whose attributes start at `from`.
///
/// Quoted strings and `{...}` expressions are skipped so that `=>` inside an
/// attribute does not end the tag.
pub(crate) fn skip_tag(chars: &[char], from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut braces = 0;

    for (offset, &c) in chars[from.min(chars.len())..].iter().enumerate() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '{' => braces += 1,
                '}' => braces -= 1,
                '>' if braces <= 0 => return Some(from + offset),
                _ => {}
            },
        }
    }

    None
}
