//! Version list panel (left).
//!
//! One row per version in insertion order: `● Version 2 – label`. The dot
//! marks the active version; "Original" is drawn in its own color because it
//! cannot be renamed or deleted.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

use docrev_core::Version;

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

/// Renders the version list with the `ListState` highlight applied.
pub fn render_version_list(frame: &mut Frame, area: Rect, focus: PanelFocus, state: &mut AppState, theme: &Theme) {
    let is_focused = focus == PanelFocus::Versions;

    let (title, items) = match &state.session {
        Some(session) => {
            let store = session.store();
            let active = store.active_key();
            let items: Vec<ListItem> = store
                .iter()
                .map(|v| version_item(v, active == Some(v.key.as_str()), theme))
                .collect();
            (format!("Versions ({})", store.len()), items)
        }
        None => {
            let msg = if state.generating { "Generating..." } else { "No document" };
            ("Versions".to_owned(), vec![ListItem::new(Line::raw(msg))])
        }
    };

    let list = List::new(items)
        .block(panel_block(title, is_focused, theme))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut state.version_list_state);
}

fn version_item(version: &Version, is_active: bool, theme: &Theme) -> ListItem<'static> {
    let marker = if is_active {
        Span::styled("● ", Style::default().fg(theme.version_active))
    } else {
        Span::raw("  ")
    };
    let key_style = if version.is_original() {
        Style::default().fg(theme.version_original)
    } else if is_active {
        Style::default().fg(theme.version_active).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    ListItem::new(Line::from(vec![
        marker,
        Span::styled(version.key.clone(), key_style),
        Span::styled(format!(" – {}", version.label), Style::default().fg(theme.version_label)),
    ]))
}
