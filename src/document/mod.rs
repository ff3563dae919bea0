/*!
 * Line-oriented handling of MDX/Markdown documents.
 *
 * - `model`: documents, translation units and their kinds
 * - `inline`: inline code/link/URL protection within a line
 * - `segmenter`: the line classification state machine
 * - `reconcile`: placeholder template and reassembly
 */

pub use self::model::{Document, LineEnding, TranslationUnit, UnitContext, UnitKind};
pub use self::reconcile::{reconcile_line, SegmentedDocument};
pub use self::segmenter::{LineClass, Segmenter, SegmenterState};

pub mod inline;
pub mod model;
pub mod reconcile;
pub mod segmenter;
