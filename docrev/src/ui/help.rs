//! Help overlay.
//!
//! A centred modal drawn over the panels in the same `terminal.draw()` call:
//! `Clear` erases the area first, then a bordered `Paragraph` lists every key.

use ratatui::{
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

/// Renders the help overlay scrolled by `help_scroll` rows.
///
/// Skipped below 60 columns, where the centred rect would collapse.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  j/k scroll · ? or Esc to dismiss ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Navigation"),
        Line::from("  j / k         Scroll down / up one line"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Scroll half page down / up"),
        Line::from("  Ctrl-f / b    Scroll full page down / up"),
        Line::from("  H / L / Tab   Move panel focus"),
        Line::from(""),
        Line::from("Versions"),
        Line::from("  Enter         Make the highlighted version active"),
        Line::from("  r             Rename the highlighted version"),
        Line::from("  x             Delete the highlighted version"),
        Line::from("  c             Compare the active version with Original"),
        Line::from(""),
        Line::from("Document"),
        Line::from("  [ / ]         Previous / next heading or change"),
        Line::from("  < / >         Shrink / grow the document panel by 5%"),
        Line::from("  e             Edit the active version in place"),
        Line::from("  Ctrl-s        Save edits (while editing)"),
        Line::from("  Esc           Save and stop editing"),
        Line::from(""),
        Line::from("Chat"),
        Line::from("  i             Write a refinement request"),
        Line::from("  Enter         Send (in chat) / save the new version (in label prompt)"),
        Line::from("  Esc           Leave chat / cancel the request in flight"),
        Line::from(""),
        Line::from("General"),
        Line::from("  R             Regenerate documentation (starts a new session)"),
        Line::from("  b             Pick a branch and regenerate"),
        Line::from("  p             Pick a persona and regenerate"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q             Quit (confirms while a refinement is unfinished)"),
    ])
}
