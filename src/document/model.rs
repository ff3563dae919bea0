/*!
 * Document and translation unit model.
 *
 * A `Document` is the line sequence read from one source file. Segmenting it
 * yields `TranslationUnit`s, the spans of prose that get sent to the
 * translation backend, each tied back to the physical line it came from.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How a unit's translation is put back into its line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Quoted `title:` value in front matter or an export block
    Title,
    /// Heading text after the `#` marker
    Header,
    /// List item text after the bullet
    ListItem,
    /// Plain paragraph line
    Paragraph,
    /// Paragraph line carrying inline `<`/`>` markup
    ParagraphWithInlineMarkup,
    /// Non-empty line inside a prose-language code fence
    CodeProse,
    /// Text between the tags of a single-line `<Tag>text</Tag>`
    ComponentInline,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Header => "header",
            Self::ListItem => "list-item",
            Self::Paragraph => "paragraph",
            Self::ParagraphWithInlineMarkup => "paragraph-inline-markup",
            Self::CodeProse => "code-prose",
            Self::ComponentInline => "component-inline",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural text stripped from a unit and restored around its translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitContext {
    /// Name of the component wrapping an inline unit
    Component(String),
    /// Decorative glyphs (and following spaces) in front of a title or heading
    EmojiPrefix(String),
    /// List bullet including its trailing whitespace, e.g. `"- "` or `"2. "`
    Bullet(String),
}

/// A span of prose scheduled for translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Placeholder index, dense and in emission order
    pub id: usize,
    /// 0-based index of the line the unit belongs to
    pub line_index: usize,
    /// `None` for a unit covering the line's whole prose, otherwise the
    /// position among the prose segments of a split line
    pub segment: Option<usize>,
    /// Text sent to the backend
    pub raw_text: String,
    pub kind: UnitKind,
    pub context: Option<UnitContext>,
}

impl TranslationUnit {
    pub fn is_whole_line(&self) -> bool {
        self.segment.is_none()
    }
}

/// Line terminator used by a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Join `lines`, putting `terminators[i]` after line `i`
pub(crate) fn join_lines<S: AsRef<str>>(lines: &[S], terminators: &[LineEnding]) -> String {
    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            let ending = terminators.get(index - 1).copied().unwrap_or(LineEnding::Lf);
            out.push_str(ending.as_str());
        }
        out.push_str(line.as_ref());
    }
    out
}

/// An ordered sequence of lines read from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source_path: Option<PathBuf>,
    lines: Vec<String>,
    /// Terminator after each line but the last
    terminators: Vec<LineEnding>,
}

impl Document {
    /// Split raw text into lines, remembering each line's terminator.
    ///
    /// A trailing newline shows up as a final empty line, so `to_text`
    /// reproduces the input exactly, mixed line endings included.
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut terminators = Vec::new();
        let mut pieces = text.split('\n').peekable();

        while let Some(piece) = pieces.next() {
            if pieces.peek().is_none() {
                lines.push(piece.to_string());
                break;
            }
            match piece.strip_suffix('\r') {
                Some(line) => {
                    lines.push(line.to_string());
                    terminators.push(LineEnding::CrLf);
                }
                None => {
                    lines.push(piece.to_string());
                    terminators.push(LineEnding::Lf);
                }
            }
        }

        Self {
            source_path: None,
            lines,
            terminators,
        }
    }

    /// Read a document from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document: {}", path.display()))?;
        let mut document = Self::parse(&text);
        document.source_path = Some(path.to_path_buf());
        Ok(document)
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `CrLf` when any line ends with `\r\n`
    pub fn line_ending(&self) -> LineEnding {
        if self.terminators.contains(&LineEnding::CrLf) {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn terminators(&self) -> &[LineEnding] {
        &self.terminators
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Reassemble the document text
    pub fn to_text(&self) -> String {
        join_lines(&self.lines, &self.terminators)
    }
}
