//! Owned request/response types for the render worker thread.
//!
//! Everything here is fully owned and `Send` so it can cross from the main
//! thread to the worker and back without borrowing from `AppState`.

use docrev_core::DiffStats;
use ratatui::text::Line;

/// What the centre panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewKind {
    /// The selected version's markdown, highlighted.
    #[default]
    Document,
    /// Side-by-side comparison of "Original" against the selected version.
    Compare,
}

/// Commands sent from the main thread to the render worker.
#[derive(Debug)]
pub enum RenderRequest {
    /// Highlight a document.
    Document {
        /// Version key the content belongs to.
        key: String,
        content: String,
    },
    /// Diff `original` against `edited` and lay it out in two columns.
    Compare {
        key: String,
        original: String,
        edited: String,
        /// Width of each column in cells (excluding the separator).
        column_width: u16,
    },
}

/// Result sent from the render worker back to the main thread.
///
/// Carried inside `AppEvent::Rendered(Box<RenderPayload>)`.
#[derive(Debug)]
pub struct RenderPayload {
    pub key: String,
    pub view: ViewKind,
    pub lines: Vec<Line<'static>>,
    /// Indices into `lines` to jump between with `[` / `]`: markdown headings
    /// in document view, the start of each changed run in compare view.
    pub jump_offsets: Vec<usize>,
    /// Line counts of the comparison (compare view only).
    pub stats: Option<DiffStats>,
}
