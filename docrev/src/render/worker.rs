//! Background thread that owns the syntect sets for its lifetime.
//!
//! All communication is via channels: `RenderRequest` in over crossbeam,
//! `AppEvent::Rendered` out over the tokio event bus.

use std::sync::LazyLock;

use crossbeam_channel::Receiver;
use docrev_core::diff::{diff, DiffSegment, DiffStats, SegmentKind};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use similar::{ChangeTag, TextDiff};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::event::AppEvent;
use crate::render::types::{RenderPayload, RenderRequest, ViewKind};

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const SEPARATOR: &str = " │ ";

/// Entry point for the render thread.
///
/// Loops over incoming requests until the channel is closed (sender dropped).
/// Results are sent back via `event_tx` as `AppEvent::Rendered`.
pub fn render_worker_loop(rx: Receiver<RenderRequest>, event_tx: UnboundedSender<AppEvent>) {
    // Load the sets now so the first request is not slow.
    let _ = &*PS;
    let _ = &*TS;

    for request in rx {
        let payload = handle_request(request);
        debug!(key = %payload.key, view = ?payload.view, lines = payload.lines.len(), "rendered");
        if event_tx.send(AppEvent::Rendered(Box::new(payload))).is_err() {
            break;
        }
    }
}

fn handle_request(request: RenderRequest) -> RenderPayload {
    match request {
        RenderRequest::Document { key, content } => {
            let (lines, jump_offsets) = highlight_markdown(&content);
            RenderPayload { key, view: ViewKind::Document, lines, jump_offsets, stats: None }
        }
        RenderRequest::Compare { key, original, edited, column_width } => {
            let segments = diff(&original, &edited);
            let stats = DiffStats::from_segments(&segments);
            let (lines, jump_offsets) = compare_lines(&segments, column_width as usize);
            RenderPayload { key, view: ViewKind::Compare, lines, jump_offsets, stats: Some(stats) }
        }
    }
}

// ---------------------------------------------------------------------------
// Document view
// ---------------------------------------------------------------------------

/// Highlights `content` as markdown.
///
/// Returns the lines and the indices of heading lines outside code fences.
fn highlight_markdown(content: &str) -> (Vec<Line<'static>>, Vec<usize>) {
    let syntax = PS.find_syntax_by_extension("md").unwrap_or_else(|| PS.find_syntax_plain_text());
    let theme = TS.themes.get("base16-ocean.dark").or_else(|| TS.themes.values().next());

    let mut lines = Vec::new();
    let mut headings = Vec::new();
    let mut in_fence = false;
    let mut highlighter = theme.map(|t| HighlightLines::new(syntax, t));

    for raw in LinesWithEndings::from(content) {
        let text = raw.trim_end_matches(['\n', '\r']);
        if text.trim_start().starts_with("```") {
            in_fence = !in_fence;
        } else if !in_fence && text.starts_with('#') {
            headings.push(lines.len());
        }

        let spans = match highlighter.as_mut() {
            Some(h) => match h.highlight_line(raw, &PS) {
                Ok(ranges) => ranges
                    .into_iter()
                    .map(|(style, piece)| syntect_to_span(style, piece.trim_end_matches(['\n', '\r'])))
                    .filter(|span| !span.content.is_empty())
                    .collect(),
                Err(_) => vec![Span::raw(text.to_owned())],
            },
            None => vec![Span::raw(text.to_owned())],
        };
        lines.push(Line::from(spans));
    }
    (lines, headings)
}

/// Converts a syntect (Style, &str) pair to an owned ratatui Span.
///
/// Only the foreground is carried over so the terminal background shows through.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    let fg = style.foreground;
    let mut ratatui_style = Style::default();
    if fg.a > 0 {
        ratatui_style = ratatui_style.fg(Color::Rgb(fg.r, fg.g, fg.b));
    }
    let font = style.font_style;
    if font.contains(syntect::highlighting::FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if font.contains(syntect::highlighting::FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    Span::styled(content.to_owned(), ratatui_style)
}

// ---------------------------------------------------------------------------
// Compare view
// ---------------------------------------------------------------------------

/// Lays diff segments out as `original │ edited` rows.
///
/// A removed run immediately followed by an added run is paired line by line
/// with word-level emphasis; leftover lines of the longer side get an empty
/// cell opposite. Returns the rows and the index of the first row of every
/// changed run.
fn compare_lines(segments: &[DiffSegment], width: usize) -> (Vec<Line<'static>>, Vec<usize>) {
    let width = width.max(8);
    let mut out: Vec<Line<'static>> = Vec::new();
    let mut offsets = Vec::new();
    let mut i = 0;

    while i < segments.len() {
        let seg = &segments[i];
        match seg.kind {
            SegmentKind::Unchanged => {
                for line in seg.text.lines() {
                    let cell = vec![Span::styled(line.to_owned(), context_style())];
                    out.push(row(cell.clone(), cell, width));
                }
            }
            SegmentKind::Removed => {
                offsets.push(out.len());
                let added = segments
                    .get(i + 1)
                    .filter(|next| next.kind == SegmentKind::Added);
                let old: Vec<&str> = seg.text.lines().collect();
                let new: Vec<&str> = added.map(|s| s.text.lines().collect()).unwrap_or_default();
                for n in 0..old.len().max(new.len()) {
                    let (left, right) = match (old.get(n), new.get(n)) {
                        (Some(o), Some(e)) => word_diff_spans(o, e),
                        (Some(o), None) => (vec![Span::styled((*o).to_owned(), removed_style())], Vec::new()),
                        (None, Some(e)) => (Vec::new(), vec![Span::styled((*e).to_owned(), added_style())]),
                        (None, None) => (Vec::new(), Vec::new()),
                    };
                    out.push(row(left, right, width));
                }
                if added.is_some() {
                    i += 1;
                }
            }
            SegmentKind::Added => {
                offsets.push(out.len());
                for line in seg.text.lines() {
                    let cell = vec![Span::styled(line.to_owned(), added_style())];
                    out.push(row(Vec::new(), cell, width));
                }
            }
        }
        i += 1;
    }
    (out, offsets)
}

/// Computes word-level diff spans for a removed/added line pair.
///
/// Changed words are rendered bold; unchanged words use the context color.
fn word_diff_spans(old_line: &str, new_line: &str) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
    let diff = TextDiff::from_words(old_line, new_line);
    let mut old_spans: Vec<Span<'static>> = Vec::new();
    let mut new_spans: Vec<Span<'static>> = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            for (emphasized, value) in change.iter_strings_lossy() {
                let text = value.into_owned();
                match change.tag() {
                    ChangeTag::Delete => {
                        let style = emphasize(removed_style(), emphasized);
                        old_spans.push(Span::styled(text, style));
                    }
                    ChangeTag::Insert => {
                        let style = emphasize(added_style(), emphasized);
                        new_spans.push(Span::styled(text, style));
                    }
                    ChangeTag::Equal => {
                        old_spans.push(Span::styled(text.clone(), context_style()));
                        new_spans.push(Span::styled(text, context_style()));
                    }
                }
            }
        }
    }
    (old_spans, new_spans)
}

/// Joins two cells into one row, each fitted to `width` cells.
fn row(left: Vec<Span<'static>>, right: Vec<Span<'static>>, width: usize) -> Line<'static> {
    let mut spans = fit(left, width);
    spans.push(Span::styled(SEPARATOR, Style::default().fg(Color::DarkGray)));
    spans.extend(fit(right, width));
    Line::from(spans)
}

/// Truncates or pads `spans` to exactly `width` characters.
fn fit(spans: Vec<Span<'static>>, width: usize) -> Vec<Span<'static>> {
    let mut used = 0;
    let mut out = Vec::with_capacity(spans.len() + 1);
    for span in spans {
        if used >= width {
            break;
        }
        let len = span.content.chars().count();
        if used + len <= width {
            used += len;
            out.push(span);
        } else {
            let keep: String = span.content.chars().take(width - used).collect();
            used = width;
            out.push(Span::styled(keep, span.style));
        }
    }
    if used < width {
        out.push(Span::raw(" ".repeat(width - used)));
    }
    out
}

fn emphasize(style: Style, emphasized: bool) -> Style {
    if emphasized {
        style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        style
    }
}

fn added_style() -> Style {
    Style::default().fg(Color::Green)
}

fn removed_style() -> Style {
    Style::default().fg(Color::Red)
}

fn context_style() -> Style {
    Style::default().fg(Color::Gray)
}
