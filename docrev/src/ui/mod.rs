//! UI rendering for docrev.
//!
//! `render()` is the single entry point, called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each
//! panel has its own module.

mod chat;
mod doc_view;
mod help;
pub mod keybindings;
mod layout;
mod prompt;
mod version_list;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame: version list, document, chat, status bar and
/// any modal on top.
///
/// Viewport sizes and panel rects are written back into `state` first, so the
/// next keypress scrolls by the right page size and mouse clicks hit the right
/// panel.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [left, center, right, status_bar] = compute_layout(frame, state);

    state.versions_viewport_height = inner_rect(left).height;
    state.doc_viewport_height = inner_rect(center).height;
    state.chat_viewport_height = inner_rect(right).height;
    state.panel_rects = [left, center, right];
    state.set_doc_viewport_width(inner_rect(center).width);

    let focus = state.focus;

    if left.width > 0 {
        version_list::render_version_list(frame, left, focus, state, theme);
    }
    doc_view::render_document(frame, center, focus, state, theme);
    if right.width > 0 {
        chat::render_chat(frame, right, focus, state, theme);
    }

    render_status_bar(frame, status_bar, state, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        _ => prompt::render_prompt(frame, state, theme),
    }
}
