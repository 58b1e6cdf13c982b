//! Central application state for docrev.
//!
//! `AppState` owns the current [`Session`] and all mutable UI state: mode,
//! focus, scroll offsets, the text being typed and the rendered centre panel.
//! Rendering reads it; the keybinding dispatcher and the event loop mutate it.
//! Every change to the document history goes through the session's
//! operations, never through the UI fields.

use crossbeam_channel::Sender;
use docrev_core::{
    DiffStats, Error, GenerateRequest, Persona, RefinementTicket, Session, UpstreamError,
    ORIGINAL_KEY,
};
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::ListState;
use tracing::{debug, warn};

use crate::editor::DocEditor;
use crate::render::types::{RenderPayload, RenderRequest, ViewKind};

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing a chat message.
    ChatInput,
    /// A refinement is staged; typing the label for the new version.
    LabelPrompt,
    /// Typing a new label for the selected version.
    RenamePrompt,
    /// Asking whether to delete the selected version.
    ConfirmDelete,
    HelpOverlay,
    /// Asking whether to quit while a refinement is in flight or staged.
    ConfirmQuit,
    /// Asking whether to regenerate while a refinement is in flight or staged.
    ConfirmRegenerate,
    /// Editing the active version in the centre panel.
    EditDocument,
    /// Choosing a branch or persona for the next generate.
    Picker,
}

impl Mode {
    /// Modes in which keystrokes insert text.
    pub fn is_text_entry(self) -> bool {
        matches!(
            self,
            Mode::ChatInput | Mode::LabelPrompt | Mode::RenamePrompt | Mode::EditDocument
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Branch,
    Persona,
}

/// Modal list of generate parameters.
#[derive(Debug)]
pub struct Picker {
    pub kind: PickerKind,
    pub items: Vec<String>,
    pub list_state: ListState,
}

/// Which panel currently has keyboard focus.
///
/// Cycle order: `Versions` → `Document` → `Chat` → `Versions`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    Versions,
    Document,
    Chat,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Versions => PanelFocus::Chat,
            PanelFocus::Document => PanelFocus::Versions,
            PanelFocus::Chat => PanelFocus::Document,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Versions => PanelFocus::Document,
            PanelFocus::Document => PanelFocus::Chat,
            PanelFocus::Chat => PanelFocus::Versions,
        }
    }
}

/// One-line message shown in the status bar until the next action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,

    /// The current generate action's session; `None` until the first one lands.
    pub session: Option<Session>,
    /// Parameters of the last generate, replayed by `R`.
    pub generate_request: GenerateRequest,
    /// True while a generate is running.
    pub generating: bool,

    /// Selection in the version list (left). May differ from the active version
    /// until the user presses Enter.
    pub version_list_state: ListState,

    /// Whether the centre panel compares against "Original".
    pub show_compare: bool,
    /// Pre-rendered centre-panel lines from the render worker.
    pub doc_lines: Vec<Line<'static>>,
    /// Version key `doc_lines` belongs to.
    pub rendered_key: Option<String>,
    /// View `doc_lines` was rendered for.
    pub rendered_view: Option<ViewKind>,
    /// Headings (document view) or change starts (compare view) for `[` / `]`.
    pub jump_offsets: Vec<usize>,
    pub jump_cursor: usize,
    pub diff_stats: Option<DiffStats>,
    pub render_loading: bool,
    pub render_tx: Option<Sender<RenderRequest>>,

    /// Text typed in chat or a prompt.
    pub input: String,
    /// Cursor and lines of the scratch buffer while in `EditDocument`.
    pub editor: Option<DocEditor>,
    pub picker: Option<Picker>,
    pub notice: Option<Notice>,
    /// Spinner frame advanced on every tick while a backend call is in flight.
    pub spinner: usize,

    pub doc_scroll: usize,
    pub chat_scroll: u16,
    pub help_scroll: u16,

    /// Inner panel heights cached by the renderer for page-wise scrolling.
    pub versions_viewport_height: u16,
    pub doc_viewport_height: u16,
    pub chat_viewport_height: u16,
    /// Inner width of the centre panel, used to size compare columns.
    pub doc_viewport_width: u16,
    /// Outer rects of the three panels from the last frame (mouse hit tests).
    pub panel_rects: [Rect; 3],

    pub left_pct: u16,
    pub center_pct: u16,
    pub right_pct: u16,
}

impl AppState {
    pub fn new(generate_request: GenerateRequest) -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            session: None,
            generate_request,
            generating: false,
            version_list_state: ListState::default(),
            show_compare: false,
            doc_lines: Vec::new(),
            rendered_key: None,
            rendered_view: None,
            jump_offsets: Vec::new(),
            jump_cursor: 0,
            diff_stats: None,
            render_loading: false,
            render_tx: None,
            input: String::new(),
            editor: None,
            picker: None,
            notice: None,
            spinner: 0,
            doc_scroll: 0,
            chat_scroll: 0,
            help_scroll: 0,
            versions_viewport_height: 0,
            doc_viewport_height: 0,
            chat_viewport_height: 0,
            doc_viewport_width: 0,
            panel_rects: [Rect::default(); 3],
            left_pct: 20,
            center_pct: 55,
            right_pct: 25,
        }
    }

    // -----------------------------------------------------------------------
    // Notices
    // -----------------------------------------------------------------------

    pub fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice { text: text.into(), is_error: false });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!(%text, "user-visible error");
        self.notice = Some(Notice { text, is_error: true });
    }

    // -----------------------------------------------------------------------
    // Scrolling
    // -----------------------------------------------------------------------

    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Versions => self.version_list_state.scroll_down_by(lines),
            PanelFocus::Document => {
                self.doc_scroll = self.doc_scroll.saturating_add(lines as usize);
            }
            PanelFocus::Chat => self.chat_scroll = self.chat_scroll.saturating_add(lines),
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Versions => self.version_list_state.scroll_up_by(lines),
            PanelFocus::Document => {
                self.doc_scroll = self.doc_scroll.saturating_sub(lines as usize);
            }
            PanelFocus::Chat => self.chat_scroll = self.chat_scroll.saturating_sub(lines),
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Versions => self.version_list_state.select_first(),
            PanelFocus::Document => self.doc_scroll = 0,
            PanelFocus::Chat => self.chat_scroll = 0,
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Versions => self.version_list_state.select_last(),
            PanelFocus::Document => self.doc_scroll = self.doc_lines.len().saturating_sub(1),
            // ratatui clamps the paragraph offset.
            PanelFocus::Chat => self.chat_scroll = u16::MAX,
        }
    }

    fn focused_viewport_height(&self) -> u16 {
        match self.focus {
            PanelFocus::Versions => self.versions_viewport_height,
            PanelFocus::Document => self.doc_viewport_height,
            PanelFocus::Chat => self.chat_viewport_height,
        }
    }

    /// Half a page of the focused panel; at least one row on the first frame.
    pub fn half_page_down(&mut self) {
        self.scroll_down((self.focused_viewport_height() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.focused_viewport_height() / 2).max(1));
    }

    pub fn full_page_down(&mut self) {
        self.scroll_down(self.focused_viewport_height().max(1));
    }

    pub fn full_page_up(&mut self) {
        self.scroll_up(self.focused_viewport_height().max(1));
    }

    /// Jumps to the previous heading / change (`[`).
    pub fn prev_jump(&mut self) {
        let Some(last) = self.jump_offsets.len().checked_sub(1) else { return };
        self.jump_cursor = self.jump_cursor.min(last).saturating_sub(1);
        self.doc_scroll = self.jump_offsets[self.jump_cursor];
    }

    /// Jumps to the next heading / change (`]`).
    pub fn next_jump(&mut self) {
        let Some(last) = self.jump_offsets.len().checked_sub(1) else { return };
        self.jump_cursor = (self.jump_cursor + 1).min(last);
        self.doc_scroll = self.jump_offsets[self.jump_cursor];
    }

    /// Moves 5% from the centre panel to the side panels (min 20% centre).
    pub fn shrink_doc_panel(&mut self) {
        const MIN_CENTER: u16 = 20;
        const STEP: u16 = 5;
        if self.center_pct <= MIN_CENTER {
            return;
        }
        let transfer = STEP.min(self.center_pct - MIN_CENTER);
        self.center_pct -= transfer;
        let left_gain = transfer / 2;
        self.left_pct = self.left_pct.saturating_add(left_gain);
        self.right_pct = self.right_pct.saturating_add(transfer - left_gain);
    }

    /// Pulls up to 5% from the side panels into the centre (max 80% centre,
    /// min 5% per side).
    pub fn grow_doc_panel(&mut self) {
        const MAX_CENTER: u16 = 80;
        const MIN_SIDE: u16 = 5;
        const STEP: u16 = 5;
        if self.center_pct >= MAX_CENTER {
            return;
        }
        let transfer = STEP.min(MAX_CENTER - self.center_pct);
        let left_give = (transfer / 2).min(self.left_pct.saturating_sub(MIN_SIDE));
        let right_give = (transfer - transfer / 2).min(self.right_pct.saturating_sub(MIN_SIDE));
        self.left_pct -= left_give;
        self.right_pct -= right_give;
        self.center_pct += left_give + right_give;
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Replaces the session with a freshly generated one.
    pub fn install_session(&mut self, session: Session) {
        self.session = Some(session);
        self.mode = Mode::Normal;
        self.show_compare = false;
        self.input.clear();
        self.editor = None;
        self.picker = None;
        self.rendered_key = None;
        self.rendered_view = None;
        self.chat_scroll = 0;
        self.sync_list_selection();
        self.request_render();
    }

    /// Handles the end of a generate action. On failure the previous session
    /// (if any) stays in place.
    pub fn apply_generated(&mut self, result: Result<Box<Session>, Error>) {
        self.generating = false;
        match result {
            Ok(session) => {
                let repo = session.repo().to_owned();
                self.install_session(*session);
                self.info(format!("Generated documentation for {repo}"));
            }
            Err(e) => self.error(format!("Documentation generation failed: {e}")),
        }
    }

    /// Key of the version highlighted in the list.
    pub fn highlighted_key(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        let idx = self.version_list_state.selected()?;
        session.store().iter().nth(idx).map(|v| v.key.clone())
    }

    fn active_key(&self) -> Option<String> {
        self.session.as_ref()?.store().active_key().map(str::to_owned)
    }

    /// Points the list highlight at the active version.
    pub fn sync_list_selection(&mut self) {
        let position = self
            .session
            .as_ref()
            .and_then(|s| s.store().active_key().and_then(|k| s.store().position(k)));
        self.version_list_state.select(position);
    }

    /// Makes the highlighted version active (Enter on the version list).
    pub fn select_highlighted(&mut self) {
        let Some(key) = self.highlighted_key() else { return };
        let Some(session) = self.session.as_mut() else { return };
        match session.switch_version(&key) {
            Ok(()) => {
                if key == ORIGINAL_KEY {
                    self.show_compare = false;
                }
                self.request_render();
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    /// Toggles the comparison against "Original" for the active version.
    pub fn toggle_compare(&mut self) {
        match self.active_key() {
            None => {}
            Some(key) if key == ORIGINAL_KEY && !self.show_compare => {
                self.info("Select a refined version to compare with Original");
            }
            Some(_) => {
                self.show_compare = !self.show_compare;
                self.request_render();
            }
        }
    }

    /// Records the centre panel's inner width; re-renders a comparison when
    /// the column width changes.
    pub fn set_doc_viewport_width(&mut self, width: u16) {
        if self.doc_viewport_width != width {
            self.doc_viewport_width = width;
            if self.show_compare {
                self.request_render();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Asks the render worker for the active version in the current view.
    ///
    /// The content comes from the session's scratch buffer, so unsaved edits
    /// show up as well.
    pub fn request_render(&mut self) {
        let Some(session) = self.session.as_ref() else { return };
        let Some(active) = session.store().active() else { return };
        let content = session.buffer().to_owned();
        let request = if self.show_compare && !active.is_original() {
            let original = match session.store().original() {
                Some(v) => v.content.clone(),
                None => return,
            };
            let column_width = self.doc_viewport_width.saturating_sub(3) / 2;
            RenderRequest::Compare {
                key: active.key.clone(),
                original,
                edited: content,
                column_width,
            }
        } else {
            RenderRequest::Document { key: active.key.clone(), content }
        };
        if let Some(tx) = &self.render_tx {
            if tx.send(request).is_ok() {
                self.render_loading = true;
            }
        }
    }

    /// Stores a render result unless it is for a version or view that is no
    /// longer on screen.
    pub fn apply_render(&mut self, payload: RenderPayload) {
        let wanted_view = if self.show_compare { ViewKind::Compare } else { ViewKind::Document };
        if self.active_key().as_deref() != Some(payload.key.as_str()) || payload.view != wanted_view {
            debug!(key = %payload.key, "stale render dropped");
            return;
        }
        let same_target = self.rendered_key.as_deref() == Some(payload.key.as_str())
            && self.rendered_view == Some(payload.view);
        self.doc_lines = payload.lines;
        self.jump_offsets = payload.jump_offsets;
        self.diff_stats = payload.stats;
        self.rendered_key = Some(payload.key);
        self.rendered_view = Some(payload.view);
        self.render_loading = false;
        if same_target {
            // A re-render of the same view may still have fewer jump targets.
            self.jump_cursor = self.jump_cursor.min(self.jump_offsets.len().saturating_sub(1));
        } else {
            self.doc_scroll = 0;
            self.jump_cursor = 0;
        }
    }

    // -----------------------------------------------------------------------
    // Chat refinement
    // -----------------------------------------------------------------------

    pub fn is_refining(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_refining)
    }

    /// Anything that quitting would throw away.
    pub fn has_unfinished_refinement(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.is_refining() || s.pending().is_some())
    }

    /// Opens the chat input.
    pub fn start_chat(&mut self) {
        if self.session.is_none() {
            self.info("Nothing to refine yet");
            return;
        }
        self.focus = PanelFocus::Chat;
        self.mode = Mode::ChatInput;
    }

    /// Sends the typed message. Returns the ticket for the caller to dispatch
    /// to the chat collaborator.
    pub fn submit_chat(&mut self) -> Option<RefinementTicket> {
        let message = self.input.trim().to_owned();
        if message.is_empty() {
            return None;
        }
        let session = self.session.as_mut()?;
        match session.begin_refinement(&message) {
            Ok(ticket) => {
                self.input.clear();
                self.mode = Mode::Normal;
                self.chat_scroll = u16::MAX;
                Some(ticket)
            }
            Err(e) => {
                self.error(e.to_string());
                None
            }
        }
    }

    /// Handles the chat collaborator's answer.
    pub fn apply_refined(&mut self, ticket: &RefinementTicket, result: Result<String, UpstreamError>) {
        let Some(session) = self.session.as_mut() else { return };
        match session.complete_refinement(ticket, result).map(|p| p.fallback) {
            Ok(fallback) => {
                if self.mode == Mode::EditDocument {
                    self.finish_edit();
                }
                self.picker = None;
                self.input.clear();
                self.mode = Mode::LabelPrompt;
                self.chat_scroll = u16::MAX;
                if fallback {
                    self.info("Section heading not found; the refinement will be appended");
                }
            }
            Err(Error::StaleRefinement) => {}
            Err(e) => {
                self.chat_scroll = u16::MAX;
                self.error(e.to_string());
            }
        }
    }

    /// Abandons the in-flight request. The caller aborts the task.
    pub fn cancel_refinement(&mut self) -> bool {
        let cancelled = self.session.as_mut().is_some_and(Session::cancel_refinement);
        if cancelled {
            self.info("Refinement cancelled");
        }
        cancelled
    }

    /// Commits the staged refinement with the typed label.
    pub fn confirm_label(&mut self) {
        let Some(session) = self.session.as_mut() else { return };
        match session.commit_pending(&self.input) {
            Ok(key) => {
                self.info(format!("Created {key}"));
                self.input.clear();
                self.mode = Mode::Normal;
                self.sync_list_selection();
                self.request_render();
            }
            Err(e) => {
                self.mode = Mode::Normal;
                self.error(e.to_string());
            }
        }
    }

    /// Throws the staged refinement away.
    pub fn cancel_label(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.discard_pending();
        }
        self.input.clear();
        self.mode = Mode::Normal;
        self.info("Refinement discarded");
    }

    // -----------------------------------------------------------------------
    // Rename / delete
    // -----------------------------------------------------------------------

    /// Opens the rename prompt for the highlighted version.
    pub fn start_rename(&mut self) {
        let Some(key) = self.highlighted_key() else { return };
        if key == ORIGINAL_KEY {
            self.error("Original cannot be renamed");
            return;
        }
        self.input = self
            .session
            .as_ref()
            .and_then(|s| s.store().get(&key).ok())
            .map(|v| v.label.clone())
            .unwrap_or_default();
        self.mode = Mode::RenamePrompt;
    }

    pub fn confirm_rename(&mut self) {
        self.mode = Mode::Normal;
        let Some(key) = self.highlighted_key() else { return };
        let Some(session) = self.session.as_mut() else { return };
        match session.rename(&key, &self.input) {
            Ok(()) => self.info(format!("Renamed {key}")),
            Err(e) => self.error(e.to_string()),
        }
        self.input.clear();
    }

    /// Opens the delete confirmation for the highlighted version.
    pub fn start_delete(&mut self) {
        match self.highlighted_key() {
            Some(key) if key == ORIGINAL_KEY => self.error("Original cannot be deleted"),
            Some(_) => self.mode = Mode::ConfirmDelete,
            None => {}
        }
    }

    pub fn confirm_delete(&mut self) {
        self.mode = Mode::Normal;
        let Some(key) = self.highlighted_key() else { return };
        let Some(session) = self.session.as_mut() else { return };
        match session.delete(&key) {
            Ok(()) => {
                self.info(format!("Deleted {key}"));
                if self.active_key().as_deref() == Some(ORIGINAL_KEY) {
                    self.show_compare = false;
                }
                self.sync_list_selection();
                self.request_render();
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // In-place editing
    // -----------------------------------------------------------------------

    /// Opens the active version's scratch buffer in the centre panel.
    ///
    /// "Original" stays read-only here so comparisons keep a fixed baseline.
    pub fn start_edit(&mut self) {
        let Some(session) = self.session.as_ref() else {
            self.info("Nothing to edit yet");
            return;
        };
        if session.store().active_key() == Some(ORIGINAL_KEY) {
            self.error("Original is read-only; select a refined version to edit");
            return;
        }
        self.editor = Some(DocEditor::new(session.buffer()));
        self.show_compare = false;
        self.focus = PanelFocus::Document;
        self.mode = Mode::EditDocument;
    }

    /// Applies one editor operation and mirrors the result into the session's
    /// scratch buffer.
    pub fn edit_document(&mut self, op: impl FnOnce(&mut DocEditor)) {
        let Some(editor) = self.editor.as_mut() else { return };
        op(editor);
        editor.follow_cursor(self.doc_viewport_height as usize);
        let text = editor.text();
        if let Some(session) = self.session.as_mut() {
            session.set_buffer(text);
        }
    }

    /// Writes the scratch buffer into the active version (Ctrl-s).
    pub fn save_edit(&mut self) {
        let Some(session) = self.session.as_mut() else { return };
        match session.save_buffer() {
            Ok(()) => {
                let key = session.store().active_key().unwrap_or_default().to_owned();
                self.info(format!("Saved {key}"));
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    /// Saves, leaves the editor and re-renders the saved content.
    pub fn finish_edit(&mut self) {
        self.save_edit();
        self.editor = None;
        self.mode = Mode::Normal;
        self.request_render();
    }

    // -----------------------------------------------------------------------
    // Generate parameters
    // -----------------------------------------------------------------------

    /// Lists the branches reported by the service.
    pub fn open_branch_picker(&mut self) {
        let Some(session) = self.session.as_ref() else {
            self.info("No branches yet");
            return;
        };
        if session.branches().is_empty() {
            self.info("The service reported no branches");
            return;
        }
        let items = session.branches().to_vec();
        let current = self.generate_request.branch.as_deref().or(session.branch());
        let selected = current.and_then(|b| items.iter().position(|i| i == b)).unwrap_or(0);
        self.open_picker(PickerKind::Branch, items, selected);
    }

    pub fn open_persona_picker(&mut self) {
        let items: Vec<String> = Persona::ALL.iter().map(ToString::to_string).collect();
        let selected = Persona::ALL
            .iter()
            .position(|p| *p == self.generate_request.persona)
            .unwrap_or(0);
        self.open_picker(PickerKind::Persona, items, selected);
    }

    fn open_picker(&mut self, kind: PickerKind, items: Vec<String>, selected: usize) {
        let mut list_state = ListState::default();
        list_state.select(Some(selected));
        self.picker = Some(Picker { kind, items, list_state });
        self.mode = Mode::Picker;
    }

    pub fn picker_down(&mut self) {
        if let Some(picker) = self.picker.as_mut() {
            let last = picker.items.len().saturating_sub(1);
            let next = picker.list_state.selected().map_or(0, |i| (i + 1).min(last));
            picker.list_state.select(Some(next));
        }
    }

    pub fn picker_up(&mut self) {
        if let Some(picker) = self.picker.as_mut() {
            let prev = picker.list_state.selected().map_or(0, |i| i.saturating_sub(1));
            picker.list_state.select(Some(prev));
        }
    }

    pub fn close_picker(&mut self) {
        self.picker = None;
        self.mode = Mode::Normal;
    }

    /// Stores the highlighted choice in `generate_request`. Returns whether it
    /// differs from the current session, i.e. whether a regenerate is due.
    pub fn confirm_picker(&mut self) -> bool {
        let Some(picker) = self.picker.take() else { return false };
        self.mode = Mode::Normal;
        let Some(choice) = picker.list_state.selected().and_then(|i| picker.items.get(i)) else {
            return false;
        };
        let session = self.session.as_ref();
        let changed = match picker.kind {
            PickerKind::Branch => {
                self.generate_request.branch = Some(choice.clone());
                session.and_then(Session::branch) != Some(choice.as_str())
            }
            PickerKind::Persona => match choice.parse::<Persona>() {
                Ok(persona) => {
                    self.generate_request.persona = persona;
                    session.map(Session::persona) != Some(persona)
                }
                Err(e) => {
                    self.error(e);
                    return false;
                }
            },
        };
        if !changed {
            self.info(format!("Already on {choice}"));
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Regenerate
    // -----------------------------------------------------------------------

    /// Whether `R` may start a generate right away. Asks for confirmation when
    /// a refinement would be lost.
    pub fn request_regenerate(&mut self) -> bool {
        if self.generating {
            self.info("Generation already in progress");
            false
        } else if self.has_unfinished_refinement() {
            self.mode = Mode::ConfirmRegenerate;
            false
        } else {
            true
        }
    }

    /// Advances the spinner while something is in flight.
    pub fn on_tick(&mut self) {
        if self.generating || self.is_refining() {
            self.spinner = self.spinner.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrev_core::{Persona, RefinementPipeline};

    const DOC: &str = "# Doc\n### 2. Complete API Reference\nfoo()\n";

    fn state_with_session() -> (AppState, crossbeam_channel::Receiver<RenderRequest>) {
        state_with_branches(Vec::new())
    }

    fn state_with_branches(branches: Vec<String>) -> (AppState, crossbeam_channel::Receiver<RenderRequest>) {
        let request = GenerateRequest { repo: "repo".into(), persona: Persona::default(), branch: None };
        let mut state = AppState::new(request);
        let (tx, rx) = crossbeam_channel::unbounded();
        state.render_tx = Some(tx);
        state.install_session(Session::from_document(
            "repo",
            Persona::default(),
            DOC,
            branches,
            RefinementPipeline::default(),
        ));
        (state, rx)
    }

    fn payload(key: &str, view: ViewKind, jump_offsets: Vec<usize>) -> RenderPayload {
        RenderPayload { key: key.into(), view, lines: vec![Line::raw("x"); 12], jump_offsets, stats: None }
    }

    fn active_content(state: &AppState) -> String {
        state.session.as_ref().unwrap().store().active().unwrap().content.clone()
    }

    fn refine(state: &mut AppState, delta: &str, label: &str) {
        state.input = "please".into();
        let ticket = state.submit_chat().unwrap();
        state.apply_refined(&ticket, Ok(delta.into()));
        assert_eq!(state.mode, Mode::LabelPrompt);
        state.input = label.into();
        state.confirm_label();
    }

    #[test]
    fn panel_focus_cycles() {
        assert_eq!(PanelFocus::Versions.next(), PanelFocus::Document);
        assert_eq!(PanelFocus::Chat.next(), PanelFocus::Versions);
        assert_eq!(PanelFocus::Versions.prev(), PanelFocus::Chat);
    }

    #[test]
    fn installing_a_session_requests_a_document_render() {
        let (state, rx) = state_with_session();
        assert_eq!(state.version_list_state.selected(), Some(0));
        assert!(matches!(rx.try_recv(), Ok(RenderRequest::Document { ref key, .. }) if key == ORIGINAL_KEY));
    }

    #[test]
    fn chat_turn_creates_labeled_version() {
        let (mut state, _rx) = state_with_session();
        refine(&mut state, "bar()", "bar docs");
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.store().active_key(), Some("Version 1"));
        assert_eq!(session.store().get("Version 1").unwrap().label, "bar docs");
        assert_eq!(state.version_list_state.selected(), Some(1));
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn cancelling_the_label_discards_the_refinement() {
        let (mut state, _rx) = state_with_session();
        state.input = "please".into();
        let ticket = state.submit_chat().unwrap();
        state.apply_refined(&ticket, Ok("x".into()));
        state.cancel_label();
        assert_eq!(state.session.as_ref().unwrap().store().len(), 1);
        assert!(!state.has_unfinished_refinement());
    }

    #[test]
    fn original_cannot_be_renamed_or_deleted_from_the_ui() {
        let (mut state, _rx) = state_with_session();
        state.start_rename();
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.notice.as_ref().unwrap().is_error);
        state.start_delete();
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn compare_requires_a_refined_version() {
        let (mut state, rx) = state_with_session();
        state.toggle_compare();
        assert!(!state.show_compare);

        refine(&mut state, "bar()", "");
        while rx.try_recv().is_ok() {}
        state.toggle_compare();
        assert!(state.show_compare);
        assert!(matches!(rx.try_recv(), Ok(RenderRequest::Compare { .. })));
    }

    #[test]
    fn deleting_highlighted_version_moves_selection() {
        let (mut state, _rx) = state_with_session();
        refine(&mut state, "one()", "one");
        refine(&mut state, "two()", "two");
        state.version_list_state.select(Some(2));
        state.start_delete();
        assert_eq!(state.mode, Mode::ConfirmDelete);
        state.confirm_delete();
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.store().active_key(), Some("Version 1"));
        assert_eq!(state.version_list_state.selected(), Some(1));
    }

    #[test]
    fn stale_render_is_ignored() {
        let (mut state, _rx) = state_with_session();
        state.apply_render(RenderPayload {
            key: "Version 9".into(),
            view: ViewKind::Document,
            lines: vec![Line::raw("stale")],
            jump_offsets: Vec::new(),
            stats: None,
        });
        assert!(state.doc_lines.is_empty());
        assert!(state.render_loading);
    }

    #[test]
    fn diff_panel_resize_respects_bounds() {
        let (mut state, _rx) = state_with_session();
        for _ in 0..20 {
            state.grow_doc_panel();
        }
        assert_eq!(state.center_pct, 80);
        assert_eq!(state.left_pct + state.center_pct + state.right_pct, 100);
        for _ in 0..20 {
            state.shrink_doc_panel();
        }
        assert_eq!(state.center_pct, 20);
    }

    #[test]
    fn toggling_compare_resets_jump_cursor() {
        let (mut state, _rx) = state_with_session();
        refine(&mut state, "bar()", "bar");
        state.apply_render(payload("Version 1", ViewKind::Document, vec![0, 2, 4, 6, 8, 10]));
        for _ in 0..5 {
            state.next_jump();
        }
        assert_eq!(state.jump_cursor, 5);

        state.toggle_compare();
        state.apply_render(payload("Version 1", ViewKind::Compare, vec![1]));
        assert_eq!(state.jump_cursor, 0);
        state.prev_jump();
        assert_eq!(state.jump_cursor, 0);
        assert_eq!(state.doc_scroll, 1);
        state.next_jump();
        assert_eq!(state.doc_scroll, 1);
    }

    #[test]
    fn rerender_with_fewer_jump_targets_clamps_cursor() {
        let (mut state, _rx) = state_with_session();
        state.apply_render(payload(ORIGINAL_KEY, ViewKind::Document, vec![0, 2, 4, 6]));
        for _ in 0..3 {
            state.next_jump();
        }
        state.apply_render(payload(ORIGINAL_KEY, ViewKind::Document, vec![0, 5]));
        assert_eq!(state.jump_cursor, 1);
        state.prev_jump();
        assert_eq!(state.doc_scroll, 0);
        state.next_jump();
        assert_eq!(state.doc_scroll, 5);

        state.apply_render(payload(ORIGINAL_KEY, ViewKind::Document, Vec::new()));
        state.next_jump();
        state.prev_jump();
        assert_eq!(state.doc_scroll, 5);
    }

    #[test]
    fn original_is_not_editable() {
        let (mut state, _rx) = state_with_session();
        state.start_edit();
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.editor.is_none());
        assert!(state.notice.as_ref().unwrap().is_error);
    }

    #[test]
    fn edits_reach_the_buffer_and_save_on_exit() {
        let (mut state, rx) = state_with_session();
        refine(&mut state, "bar()", "bar");
        let before = active_content(&state);
        state.show_compare = true;
        state.start_edit();
        assert_eq!(state.mode, Mode::EditDocument);
        assert_eq!(state.focus, PanelFocus::Document);
        assert!(!state.show_compare);

        state.edit_document(|e| e.insert_char('!'));
        let edited = format!("!{before}");
        assert_eq!(state.session.as_ref().unwrap().buffer(), edited);
        assert_eq!(active_content(&state), before);

        while rx.try_recv().is_ok() {}
        state.finish_edit();
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.editor.is_none());
        assert_eq!(active_content(&state), edited);
        assert!(matches!(rx.try_recv(), Ok(RenderRequest::Document { ref content, .. }) if *content == edited));
    }

    #[test]
    fn compare_render_uses_unsaved_buffer() {
        let (mut state, rx) = state_with_session();
        refine(&mut state, "bar()", "bar");
        state.start_edit();
        state.edit_document(|e| {
            e.line_end();
            e.insert_char('?');
        });
        let buffer = state.session.as_ref().unwrap().buffer().to_owned();

        while rx.try_recv().is_ok() {}
        state.show_compare = true;
        state.request_render();
        match rx.try_recv() {
            Ok(RenderRequest::Compare { original, edited, .. }) => {
                assert_eq!(original, DOC);
                assert_eq!(edited, buffer);
            }
            other => panic!("expected a compare request, got {other:?}"),
        }
    }

    #[test]
    fn refinement_landing_mid_edit_keeps_the_edits() {
        let (mut state, _rx) = state_with_session();
        refine(&mut state, "bar()", "bar");
        state.input = "more".into();
        let ticket = state.submit_chat().unwrap();
        state.start_edit();
        state.edit_document(|e| e.insert_char('!'));

        state.apply_refined(&ticket, Ok("baz()".into()));
        assert_eq!(state.mode, Mode::LabelPrompt);
        assert!(state.editor.is_none());
        assert!(active_content(&state).starts_with('!'));
    }

    #[test]
    fn branch_picker_stores_choice_for_next_generate() {
        let (mut state, _rx) = state_with_branches(vec!["main".into(), "dev".into()]);
        state.open_branch_picker();
        assert_eq!(state.mode, Mode::Picker);
        let picker = state.picker.as_ref().unwrap();
        assert_eq!(picker.kind, PickerKind::Branch);
        assert_eq!(picker.list_state.selected(), Some(0));

        state.picker_down();
        state.picker_down();
        assert!(state.confirm_picker());
        assert_eq!(state.generate_request.branch.as_deref(), Some("dev"));
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.picker.is_none());
    }

    #[test]
    fn picking_the_current_branch_does_not_regenerate() {
        let (mut state, _rx) = state_with_branches(vec!["main".into(), "dev".into()]);
        state.open_branch_picker();
        assert!(!state.confirm_picker());
        assert_eq!(state.generate_request.branch.as_deref(), Some("main"));
    }

    #[test]
    fn branch_picker_needs_reported_branches() {
        let (mut state, _rx) = state_with_session();
        state.open_branch_picker();
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.picker.is_none());
        assert!(state.notice.is_some());
    }

    #[test]
    fn persona_picker_starts_on_current_persona() {
        let (mut state, _rx) = state_with_session();
        state.open_persona_picker();
        assert_eq!(state.picker.as_ref().unwrap().list_state.selected(), Some(1));
        state.picker_down();
        assert!(state.confirm_picker());
        assert_eq!(state.generate_request.persona, Persona::Expert);

        state.open_persona_picker();
        state.close_picker();
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(state.generate_request.persona, Persona::Expert);
    }

    #[test]
    fn regenerate_asks_before_dropping_a_staged_refinement() {
        let (mut state, _rx) = state_with_session();
        assert!(state.request_regenerate());

        state.input = "please".into();
        let ticket = state.submit_chat().unwrap();
        state.apply_refined(&ticket, Ok("bar()".into()));
        state.mode = Mode::Normal;
        assert!(!state.request_regenerate());
        assert_eq!(state.mode, Mode::ConfirmRegenerate);
        assert!(state.session.as_ref().unwrap().pending().is_some());
    }
}
