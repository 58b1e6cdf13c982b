//! Chat panel (right): the session's chat log above a one-line input.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
    Frame,
};

use docrev_core::{ChatMessage, Sender};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_chat(frame: &mut Frame, area: Rect, focus: PanelFocus, state: &mut AppState, theme: &Theme) {
    let is_focused = focus == PanelFocus::Chat;
    frame.render_widget(panel_block("Chat", is_focused, theme), area);

    let inner = inner_rect(area);
    let [log_area, input_area] =
        inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(2)]));

    let messages = state.session.as_ref().map(|s| s.chat()).unwrap_or_default();
    let lines: Vec<Line<'static>> = if messages.is_empty() {
        vec![Line::styled(
            "Press i to ask for a refinement.",
            Style::default().fg(theme.chat_system),
        )]
    } else {
        messages.iter().flat_map(|m| message_lines(m, theme)).collect()
    };

    // Clamp so G and new messages land on the last page.
    let max_scroll = wrapped_height(&lines, log_area.width).saturating_sub(log_area.height);
    state.chat_scroll = state.chat_scroll.min(max_scroll);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((state.chat_scroll, 0)),
        log_area,
    );

    frame.render_widget(input_line(state, theme), input_area);
}

/// Rows `lines` occupy when wrapped at `width`. Word wrapping can take a few
/// more rows than this, so the last page may be slightly short.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines.iter().map(|l| l.width().div_ceil(width).max(1)).sum();
    rows.min(u16::MAX as usize) as u16
}

fn message_lines(message: &ChatMessage, theme: &Theme) -> Vec<Line<'static>> {
    let (who, color) = match message.sender {
        Sender::User => ("you", theme.chat_user),
        Sender::Assistant => ("assistant", theme.chat_assistant),
        Sender::System => ("·", theme.chat_system),
    };
    let mut lines = vec![Line::styled(
        who.to_owned(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    let body_style = if message.sender == Sender::System {
        Style::default().fg(theme.chat_system)
    } else {
        Style::default()
    };
    lines.extend(message.text.lines().map(|l| Line::styled(l.to_owned(), body_style)));
    lines.push(Line::raw(""));
    lines
}

fn input_line<'a>(state: &'a AppState, theme: &Theme) -> Paragraph<'a> {
    let line = if state.mode == Mode::ChatInput {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.status_mode_insert)),
            Span::styled(state.input.as_str(), Style::default().fg(theme.input)),
            Span::styled("█", Style::default().fg(theme.input)),
        ])
    } else if state.is_refining() {
        Line::styled("waiting for reply… (Esc cancels)", Style::default().fg(theme.status_busy))
    } else {
        Line::styled("i: chat", Style::default().fg(theme.chat_system))
    };
    Paragraph::new(vec![Line::raw(""), line]).wrap(Wrap { trim: false })
}
