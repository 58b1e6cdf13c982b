//! Line-granularity document diff.
//!
//! Both inputs are split on line boundaries (line terminators stay attached to
//! their line) and compared with Myers' algorithm. Runs of consecutive lines
//! with the same classification are coalesced into a single [`DiffSegment`],
//! so a renderer never has to merge line-by-line cells itself.
//!
//! Filtering the output and concatenating in order reconstructs the inputs:
//! `Removed + Unchanged` gives the original, `Added + Unchanged` the edited
//! text.

use similar::{Algorithm, ChangeTag, TextDiff};

/// Classification of a diff run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Unchanged,
    Added,
    Removed,
}

impl From<ChangeTag> for SegmentKind {
    fn from(tag: ChangeTag) -> Self {
        match tag {
            ChangeTag::Equal => SegmentKind::Unchanged,
            ChangeTag::Insert => SegmentKind::Added,
            ChangeTag::Delete => SegmentKind::Removed,
        }
    }
}

/// A run of whole lines sharing one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    pub kind: SegmentKind,
    /// Literal text of the run, line terminators included.
    pub text: String,
}

impl DiffSegment {
    /// Number of lines in the run. A trailing fragment without a newline counts.
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// Computes the coalesced line diff between `original` and `edited`.
///
/// Deterministic: identical inputs always yield the identical sequence.
/// Empty input on either side is valid and yields a single added or removed
/// segment (or nothing when both are empty).
pub fn diff(original: &str, edited: &str) -> Vec<DiffSegment> {
    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(original, edited);

    let mut segments: Vec<DiffSegment> = Vec::new();
    for change in text_diff.iter_all_changes() {
        let kind = SegmentKind::from(change.tag());
        match segments.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => segments.push(DiffSegment { kind, text: change.value().to_owned() }),
        }
    }
    segments
}

/// Line counts of a diff, shown next to a version in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

impl DiffStats {
    pub fn from_segments(segments: &[DiffSegment]) -> Self {
        segments.iter().fold(Self::default(), |mut stats, seg| {
            match seg.kind {
                SegmentKind::Added => stats.added += seg.line_count(),
                SegmentKind::Removed => stats.removed += seg.line_count(),
                SegmentKind::Unchanged => {}
            }
            stats
        })
    }

    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// One row of a two-column (original | edited) comparison.
///
/// Removed runs occupy only the left cell, added runs only the right cell and
/// unchanged runs both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    pub kind: SegmentKind,
    pub left: Option<String>,
    pub right: Option<String>,
}

/// Lays segments out as side-by-side rows, one row per segment.
pub fn side_by_side(segments: &[DiffSegment]) -> Vec<DiffRow> {
    segments
        .iter()
        .map(|seg| {
            let text = Some(seg.text.clone());
            match seg.kind {
                SegmentKind::Unchanged => DiffRow { kind: seg.kind, left: text.clone(), right: text },
                SegmentKind::Removed => DiffRow { kind: seg.kind, left: text, right: None },
                SegmentKind::Added => DiffRow { kind: seg.kind, left: None, right: text },
            }
        })
        .collect()
}
