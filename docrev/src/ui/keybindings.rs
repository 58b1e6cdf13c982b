//! Keybinding dispatcher for docrev.
//!
//! Translates crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` for the event loop. Anything that needs a background task
//! (sending a chat message, regenerating) is handed back to the loop rather
//! than spawned here. The dispatcher branches on `state.mode` first so each
//! mode has its own handler.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use docrev_core::RefinementTicket;
use ratatui::layout::Position;

use crate::app::{AppState, Mode, PanelFocus};

/// What the event loop should do after a key.
#[derive(Debug)]
pub enum KeyAction {
    Continue,
    Quit,
    /// Dispatch this refinement to the chat collaborator.
    Refine(RefinementTicket),
    /// Abort the in-flight refinement task.
    CancelRefinement,
    /// Run a fresh generate action.
    Regenerate,
}

/// Dispatches a key event to the handler for the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::ConfirmRegenerate => handle_confirm_regenerate(key, state),
        Mode::ConfirmDelete => handle_confirm_delete(key, state),
        Mode::ChatInput => handle_chat_input(key, state),
        Mode::LabelPrompt => handle_label_prompt(key, state),
        Mode::RenamePrompt => handle_rename_prompt(key, state),
        Mode::EditDocument => handle_edit_document(key, state),
        Mode::Picker => handle_picker(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        // Panel focus
        KeyCode::Char('H') | KeyCode::BackTab => state.focus = state.focus.prev(),
        KeyCode::Char('L') | KeyCode::Tab => state.focus = state.focus.next(),

        KeyCode::Enter if state.focus == PanelFocus::Versions => state.select_highlighted(),
        KeyCode::Enter if state.focus == PanelFocus::Chat => state.start_chat(),

        // Version management
        KeyCode::Char('r') => state.start_rename(),
        KeyCode::Char('x') => state.start_delete(),
        KeyCode::Char('c') => state.toggle_compare(),

        // Heading / change navigation
        KeyCode::Char('[') => state.prev_jump(),
        KeyCode::Char(']') => state.next_jump(),

        // Document panel resize
        KeyCode::Char('<') => state.shrink_doc_panel(),
        KeyCode::Char('>') => state.grow_doc_panel(),

        KeyCode::Char('i') => state.start_chat(),
        KeyCode::Char('e') => state.start_edit(),

        // Generate parameters
        KeyCode::Char('b') => state.open_branch_picker(),
        KeyCode::Char('p') => state.open_persona_picker(),
        KeyCode::Char('R') => {
            if state.request_regenerate() {
                return KeyAction::Regenerate;
            }
        }

        KeyCode::Esc if state.is_refining() => return KeyAction::CancelRefinement,

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }

        KeyCode::Char('q') => {
            if state.has_unfinished_refinement() {
                state.mode = Mode::ConfirmQuit;
            } else {
                return KeyAction::Quit;
            }
        }

        _ => {}
    }
    KeyAction::Continue
}

/// j / k / g / G and the Ctrl page keys. `None` when the key is not a scroll key.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::Char('f') if ctrl => state.full_page_down(),
        KeyCode::Char('b') if ctrl => state.full_page_up(),
        KeyCode::PageDown => state.full_page_down(),
        KeyCode::PageUp => state.full_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Text entry
// ---------------------------------------------------------------------------

/// Applies an editing key to `state.input`. Returns `true` when consumed.
fn edit_input(key: KeyEvent, state: &mut AppState) -> bool {
    match key.code {
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.input.clear();
            true
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.input.push(c);
            true
        }
        KeyCode::Backspace => {
            state.input.pop();
            true
        }
        _ => false,
    }
}

fn handle_chat_input(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if edit_input(key, state) {
        return KeyAction::Continue;
    }
    match key.code {
        KeyCode::Enter => {
            if let Some(ticket) = state.submit_chat() {
                return KeyAction::Refine(ticket);
            }
        }
        KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_label_prompt(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if edit_input(key, state) {
        return KeyAction::Continue;
    }
    match key.code {
        KeyCode::Enter => state.confirm_label(),
        KeyCode::Esc => state.cancel_label(),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_rename_prompt(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if edit_input(key, state) {
        return KeyAction::Continue;
    }
    match key.code {
        KeyCode::Enter => state.confirm_rename(),
        KeyCode::Esc => {
            state.input.clear();
            state.mode = Mode::Normal;
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Editor keys. Every change lands in the session's scratch buffer; Ctrl-s
/// saves it into the active version and Esc saves and leaves.
fn handle_edit_document(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let page = state.doc_viewport_height.max(1) as isize;

    match key.code {
        KeyCode::Char('s') if ctrl => state.save_edit(),
        KeyCode::Esc => state.finish_edit(),
        KeyCode::Char(c) if !ctrl => state.edit_document(|e| e.insert_char(c)),
        KeyCode::Enter => state.edit_document(|e| e.insert_newline()),
        KeyCode::Tab => state.edit_document(|e| "    ".chars().for_each(|c| e.insert_char(c))),
        KeyCode::Backspace => state.edit_document(|e| e.backspace()),
        KeyCode::Delete => state.edit_document(|e| e.delete()),
        KeyCode::Left => state.edit_document(|e| e.move_left()),
        KeyCode::Right => state.edit_document(|e| e.move_right()),
        KeyCode::Up => state.edit_document(|e| e.move_up()),
        KeyCode::Down => state.edit_document(|e| e.move_down()),
        KeyCode::Home => state.edit_document(|e| e.line_start()),
        KeyCode::End => state.edit_document(|e| e.line_end()),
        KeyCode::PageUp => state.edit_document(|e| e.move_rows(-page)),
        KeyCode::PageDown => state.edit_document(|e| e.move_rows(page)),
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Overlays and confirmations
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('G') => state.help_scroll = u16::MAX,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_picker(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.picker_down(),
        KeyCode::Char('k') | KeyCode::Up => state.picker_up(),
        KeyCode::Enter => {
            if state.confirm_picker() && state.request_regenerate() {
                return KeyAction::Regenerate;
            }
        }
        KeyCode::Esc | KeyCode::Char('q') => state.close_picker(),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_delete(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => state.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn handle_confirm_regenerate(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            state.mode = Mode::Normal;
            KeyAction::Regenerate
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Click-to-focus and scroll wheel (3 rows per notch). The wheel scrolls the
/// help overlay while it is open and moves the cursor while editing.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => focus_at(mouse.column, mouse.row, state),
        MouseEventKind::ScrollUp if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_sub(3);
        }
        MouseEventKind::ScrollDown if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_add(3);
        }
        MouseEventKind::ScrollUp if state.mode == Mode::EditDocument => {
            state.edit_document(|e| e.move_rows(-3));
        }
        MouseEventKind::ScrollDown if state.mode == Mode::EditDocument => {
            state.edit_document(|e| e.move_rows(3));
        }
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
}

/// Focuses the panel under (`col`, `row`). Collapsed panels are skipped.
fn focus_at(col: u16, row: u16, state: &mut AppState) {
    let pos = Position { x: col, y: row };
    let [left, center, right] = state.panel_rects;

    if left.width > 0 && left.contains(pos) {
        state.focus = PanelFocus::Versions;
    } else if center.contains(pos) {
        state.focus = PanelFocus::Document;
    } else if right.width > 0 && right.contains(pos) {
        state.focus = PanelFocus::Chat;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrev_core::{GenerateRequest, Persona, RefinementPipeline, Session};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state() -> AppState {
        state_with_branches(Vec::new())
    }

    fn state_with_branches(branches: Vec<String>) -> AppState {
        let mut state = AppState::new(GenerateRequest {
            repo: "repo".into(),
            persona: Persona::default(),
            branch: None,
        });
        state.install_session(Session::from_document(
            "repo",
            Persona::default(),
            "# Doc\n",
            branches,
            RefinementPipeline::default(),
        ));
        state
    }

    /// A session whose active version is a labeled refinement.
    fn refined_state() -> AppState {
        let mut state = state();
        state.input = "more".into();
        let ticket = state.submit_chat().unwrap();
        state.apply_refined(&ticket, Ok("bar()".into()));
        state.confirm_label();
        state
    }

    fn active_content(state: &AppState) -> String {
        state.session.as_ref().unwrap().store().active().unwrap().content.clone()
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(press(KeyCode::Char(c)), state);
        }
    }

    #[test]
    fn chat_enter_returns_refine_ticket() {
        let mut state = state();
        handle_key(press(KeyCode::Char('i')), &mut state);
        assert_eq!(state.mode, Mode::ChatInput);
        type_text(&mut state, "add examples");
        match handle_key(press(KeyCode::Enter), &mut state) {
            KeyAction::Refine(ticket) => assert_eq!(ticket.request.message, "add examples"),
            other => panic!("expected Refine, got {other:?}"),
        }
        assert!(state.is_refining());
    }

    #[test]
    fn blank_chat_message_is_not_sent() {
        let mut state = state();
        handle_key(press(KeyCode::Char('i')), &mut state);
        type_text(&mut state, "   ");
        assert!(matches!(handle_key(press(KeyCode::Enter), &mut state), KeyAction::Continue));
        assert!(!state.is_refining());
    }

    #[test]
    fn esc_cancels_in_flight_refinement() {
        let mut state = state();
        handle_key(press(KeyCode::Char('i')), &mut state);
        type_text(&mut state, "x");
        handle_key(press(KeyCode::Enter), &mut state);
        assert!(matches!(handle_key(press(KeyCode::Esc), &mut state), KeyAction::CancelRefinement));
    }

    #[test]
    fn quit_confirms_while_refining() {
        let mut state = state();
        assert!(matches!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Quit));

        handle_key(press(KeyCode::Char('i')), &mut state);
        type_text(&mut state, "x");
        handle_key(press(KeyCode::Enter), &mut state);
        assert!(matches!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Continue));
        assert_eq!(state.mode, Mode::ConfirmQuit);
        assert!(matches!(handle_key(press(KeyCode::Char('y')), &mut state), KeyAction::Quit));
    }

    #[test]
    fn help_overlay_toggles() {
        let mut state = state();
        handle_key(press(KeyCode::Char('?')), &mut state);
        assert_eq!(state.mode, Mode::HelpOverlay);
        handle_key(press(KeyCode::Char('j')), &mut state);
        assert_eq!(state.help_scroll, 1);
        handle_key(press(KeyCode::Esc), &mut state);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn regenerate_is_refused_while_generating() {
        let mut state = state();
        assert!(matches!(handle_key(press(KeyCode::Char('R')), &mut state), KeyAction::Regenerate));
        state.generating = true;
        assert!(matches!(handle_key(press(KeyCode::Char('R')), &mut state), KeyAction::Continue));
    }

    #[test]
    fn edit_mode_types_into_the_document() {
        let mut state = refined_state();
        let before = active_content(&state);
        handle_key(press(KeyCode::Char('e')), &mut state);
        assert_eq!(state.mode, Mode::EditDocument);

        type_text(&mut state, "q?");
        assert_eq!(state.mode, Mode::EditDocument);
        handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL), &mut state);
        assert_eq!(state.mode, Mode::EditDocument);
        assert_eq!(active_content(&state), format!("q?{before}"));

        handle_key(press(KeyCode::Backspace), &mut state);
        handle_key(press(KeyCode::Esc), &mut state);
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(active_content(&state), format!("q{before}"));
    }

    #[test]
    fn regenerate_confirms_while_refining() {
        let mut state = state();
        handle_key(press(KeyCode::Char('i')), &mut state);
        type_text(&mut state, "x");
        handle_key(press(KeyCode::Enter), &mut state);

        assert!(matches!(handle_key(press(KeyCode::Char('R')), &mut state), KeyAction::Continue));
        assert_eq!(state.mode, Mode::ConfirmRegenerate);
        assert!(matches!(handle_key(press(KeyCode::Char('n')), &mut state), KeyAction::Continue));
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.is_refining());

        handle_key(press(KeyCode::Char('R')), &mut state);
        assert!(matches!(handle_key(press(KeyCode::Char('y')), &mut state), KeyAction::Regenerate));
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn branch_picker_regenerates_on_enter() {
        let mut state = state_with_branches(vec!["main".into(), "dev".into()]);
        handle_key(press(KeyCode::Char('b')), &mut state);
        assert_eq!(state.mode, Mode::Picker);
        handle_key(press(KeyCode::Char('j')), &mut state);
        assert!(matches!(handle_key(press(KeyCode::Enter), &mut state), KeyAction::Regenerate));
        assert_eq!(state.generate_request.branch.as_deref(), Some("dev"));
    }

    #[test]
    fn persona_picker_esc_keeps_persona() {
        let mut state = state();
        handle_key(press(KeyCode::Char('p')), &mut state);
        assert_eq!(state.mode, Mode::Picker);
        handle_key(press(KeyCode::Char('j')), &mut state);
        assert!(matches!(handle_key(press(KeyCode::Esc), &mut state), KeyAction::Continue));
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(state.generate_request.persona, Persona::Intermediate);
    }
}
