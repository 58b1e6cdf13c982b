//! Responsive 3-panel layout for docrev.
//!
//! Pure layout arithmetic plus the shared panel chrome. Called inside
//! `terminal.draw()` on every frame, so the layout always follows the current
//! terminal size.
//!
//! # Panel geometry
//!
//! At `>= 100` columns all three panels are visible with widths driven by
//! `AppState.left_pct / center_pct / right_pct` (defaults 20 / 55 / 25).
//! Below that the version list collapses and the chat panel keeps a fixed
//! 32-column strip.
//!
//! `Spacing::Overlap(1)` with `MergeStrategy::Fuzzy` makes adjacent borders
//! share one column and merge their junction characters.

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
    Frame,
};

use crate::app::AppState;
use crate::theme::Theme;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Returns `[left, center, right, status_bar]` for the current frame.
///
/// The rects are only valid inside the current draw closure.
pub fn compute_layout(frame: &Frame, state: &AppState) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let horizontal = if term_width >= 100 {
        Layout::horizontal([
            Constraint::Percentage(state.left_pct),
            Constraint::Percentage(state.center_pct),
            Constraint::Percentage(state.right_pct),
        ])
    } else {
        Layout::horizontal([Constraint::Length(0), Constraint::Fill(1), Constraint::Length(32)])
    }
    .spacing(Spacing::Overlap(1));

    let [left, center, right] = main_area.layout(&horizontal);

    [left, center, right, status_bar]
}

/// Inner `Rect` of a panel after removing its 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered `Block` for a panel; thick and highlighted when focused.
///
/// `Fuzzy` merging because `Exact` produces wrong junctions when `Thick` and
/// `Plain` borders meet.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row status bar.
///
/// Left to right: mode indicator, repository and persona, the active version,
/// diff stats while comparing, a spinner while a backend call is in flight,
/// and the latest notice.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = if state.mode.is_text_entry() {
        (" INSERT ", theme.status_mode_insert)
    } else {
        (" NORMAL ", theme.status_mode_normal)
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    if let Some(session) = &state.session {
        let mut context = format!(" {} · {}", session.repo(), session.persona());
        if let Some(branch) = session.branch() {
            context.push_str(&format!(" · {branch}"));
        }
        if let Some(active) = session.store().active_key() {
            context.push_str(&format!(" · {active}"));
        }
        spans.push(Span::raw(context));
    }

    if state.show_compare {
        if let Some(stats) = state.diff_stats {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("+{}", stats.added), Style::default().fg(theme.diff_added)));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("-{}", stats.removed), Style::default().fg(theme.diff_removed)));
        }
    }

    let busy = if state.generating {
        Some("generating")
    } else if state.is_refining() {
        Some("refining")
    } else {
        None
    };
    if let Some(what) = busy {
        let frame_char = SPINNER[state.spinner % SPINNER.len()];
        spans.push(Span::styled(
            format!("  {frame_char} {what}…"),
            Style::default().fg(theme.status_busy),
        ));
    }

    if let Some(notice) = &state.notice {
        let style = if notice.is_error {
            Style::default().fg(theme.status_error).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("  {}", notice.text), style));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
