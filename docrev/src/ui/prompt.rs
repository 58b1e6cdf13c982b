//! Small centred modals: label entry, rename, the branch and persona pickers,
//! and the delete, quit and regenerate confirmations.
//!
//! Drawn last inside the same `terminal.draw()` closure, after a `Clear`, so
//! they sit on top of the panels.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{AppState, Mode, Picker, PickerKind};
use crate::theme::Theme;

/// Renders the modal for the current mode, if it has one.
pub fn render_prompt(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let target = state.highlighted_key().unwrap_or_default();
    let (title, body, editable) = match state.mode {
        Mode::LabelPrompt => {
            let mut body = vec![Line::raw("Label for the new version (empty for \"Refinement\"):")];
            if state.session.as_ref().and_then(|s| s.pending()).is_some_and(|p| p.fallback) {
                body.push(Line::styled(
                    "Section heading not found; the text will be appended at the end.",
                    Style::default().fg(theme.status_busy),
                ));
            }
            (" New version  Enter save · Esc discard ", body, true)
        }
        Mode::RenamePrompt => (
            " Rename  Enter save · Esc cancel ",
            vec![Line::raw(format!("New label for {target}:"))],
            true,
        ),
        Mode::ConfirmDelete => (
            " Delete ",
            vec![Line::raw(format!("Delete {target}? (y/n)"))],
            false,
        ),
        Mode::ConfirmQuit => (
            " Quit ",
            vec![Line::raw("A refinement is still in progress. Quit anyway? (y/n)")],
            false,
        ),
        Mode::ConfirmRegenerate => (
            " Regenerate ",
            vec![Line::raw(
                "Regenerating starts a new session and drops the unfinished refinement. Continue? (y/n)",
            )],
            false,
        ),
        Mode::Picker => {
            if let Some(picker) = &state.picker {
                render_picker(frame, picker, theme);
            }
            return;
        }
        Mode::Normal | Mode::ChatInput | Mode::HelpOverlay | Mode::EditDocument => return,
    };

    let mut lines = body;
    if editable {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.status_mode_insert)),
            Span::styled(state.input.clone(), Style::default().fg(theme.input)),
            Span::styled("█", Style::default().fg(theme.input)),
        ]));
    }

    let area = modal_area(frame.area(), lines.len() as u16 + 2);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::bordered().title(title).border_style(Style::default().fg(theme.border_active)))
            .wrap(Wrap { trim: false }),
        area,
    );
}

/// Highlighted choice list for the next generate.
fn render_picker(frame: &mut Frame, picker: &Picker, theme: &Theme) {
    let title = match picker.kind {
        PickerKind::Branch => " Branch  Enter regenerate · Esc cancel ",
        PickerKind::Persona => " Persona  Enter regenerate · Esc cancel ",
    };
    let items: Vec<ListItem> = picker.items.iter().map(|i| ListItem::new(Line::raw(i.clone()))).collect();
    let area = modal_area(frame.area(), picker.items.len().min(12) as u16 + 2);
    let list = List::new(items)
        .block(Block::bordered().title(title).border_style(Style::default().fg(theme.border_active)))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut list_state = picker.list_state.clone();
    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Centred rect at most 70 columns wide and `height` rows tall.
fn modal_area(screen: Rect, height: u16) -> Rect {
    let width = screen.width.saturating_sub(4).min(70);
    screen.centered(Constraint::Length(width), Constraint::Length(height.min(screen.height)))
}
