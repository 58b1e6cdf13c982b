//! Centre panel: the active version, its comparison with "Original", or the
//! editor over the scratch buffer.
//!
//! Only `doc_lines[doc_scroll..doc_scroll + viewport]` become `ListItem`s each
//! frame, so long documents cost O(viewport) to draw.

use ratatui::{
    layout::{Position, Rect},
    style::Style,
    text::Line,
    widgets::{List, ListItem},
    Frame,
};

use crate::app::{AppState, Mode, PanelFocus};
use crate::editor::DocEditor;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_document(frame: &mut Frame, area: Rect, focus: PanelFocus, state: &AppState, theme: &Theme) {
    let is_focused = focus == PanelFocus::Document;
    let active = state
        .session
        .as_ref()
        .and_then(|s| s.store().active())
        .map(|v| v.title());
    let editor = state.editor.as_ref().filter(|_| state.mode == Mode::EditDocument);
    let title = match (active, state.show_compare) {
        (Some(title), _) if editor.is_some() => format!("Editing {title}  Ctrl-s save · Esc done"),
        (Some(title), true) => format!("Original │ {title}"),
        (Some(title), false) => title,
        (None, _) => "Document".to_owned(),
    };
    let inner = inner_rect(area);
    let viewport_height = inner.height as usize;

    frame.render_widget(panel_block(title, is_focused, theme), area);

    if let Some(editor) = editor {
        render_editor(frame, inner, editor, theme);
        return;
    }

    if state.doc_lines.is_empty() {
        let msg = if state.generating {
            "Generating documentation..."
        } else if state.render_loading {
            "Rendering..."
        } else if state.session.is_some() {
            "(empty document)"
        } else {
            "No document yet. Press R to generate."
        };
        frame.render_widget(List::new(vec![ListItem::new(Line::raw(msg))]), inner);
        return;
    }

    let total = state.doc_lines.len();
    let visible_start = state.doc_scroll.min(total.saturating_sub(1));
    let visible_end = (visible_start + viewport_height).min(total);

    let items: Vec<ListItem> = state.doc_lines[visible_start..visible_end]
        .iter()
        .map(|l| ListItem::new(l.clone()))
        .collect();

    frame.render_widget(List::new(items), inner);
}

/// Plain lines from `editor.scroll` with the terminal cursor placed on the
/// editing position. Columns past the panel edge are clipped.
fn render_editor(frame: &mut Frame, inner: Rect, editor: &DocEditor, theme: &Theme) {
    let height = inner.height as usize;
    let items: Vec<ListItem> = editor
        .lines()
        .iter()
        .skip(editor.scroll)
        .take(height)
        .map(|l| ListItem::new(Line::styled(l.clone(), Style::default().fg(theme.input))))
        .collect();
    frame.render_widget(List::new(items), inner);

    let (row, col) = editor.cursor();
    if row >= editor.scroll && row < editor.scroll + height {
        let x = inner.x + u16::try_from(col).unwrap_or(u16::MAX).min(inner.width.saturating_sub(1));
        let y = inner.y + (row - editor.scroll) as u16;
        frame.set_cursor_position(Position { x, y });
    }
}
