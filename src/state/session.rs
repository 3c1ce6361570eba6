//! The edit-session state machine behind the mask-painting tool.
//!
//! All state changes go through [`EditSession::apply`], which takes one
//! [`EditAction`] and reports what happened as a [`Transition`]. None of the
//! transitions can fail; an action that does not apply to the current state
//! is simply ignored.
//!
//! # State Transitions
//!
//! ```text
//!                 Enter (base image present)
//!   ┌──────────┐ ─────────────────────────────► ┌──────────┐ ◄─┐ PointerDown/Move/Up/Leave,
//!   │ Inactive │                                 │  Active  │   │ Undo, Redo
//!   └──────────┘ ◄───────────────────────────── └──────────┘ ──┘
//!        ▲          Cancel / consumed by generation
//!        │
//!        └── Enter without a base image is refused (stays Inactive)
//! ```
//!
//! The active state owns the working raster buffer, its [`EditHistory`], the
//! stroke currently being drawn and whether the brush (as opposed to the
//! eraser) has been used since the session started. Tool settings live
//! outside the state so they carry over from one session to the next.

use egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::command::EditHistory;
use crate::generation::{GenerationSlot, SlotState};
use crate::raster::{RasterBuffer, RasterSnapshot};
use crate::stroke::{StrokeInProgress, StrokeMode};
use crate::tools::ToolSettings;

/// Everything an active session owns
#[derive(Debug, Clone)]
pub struct ActiveEdit {
    buffer: RasterBuffer,
    history: EditHistory,
    stroke: Option<StrokeInProgress>,
    has_painted_with_brush: bool,
    revision: u64,
}

impl ActiveEdit {
    fn new(base: RasterSnapshot) -> Self {
        let mut history = EditHistory::new();
        let buffer = base.to_buffer();
        history.start(base);
        Self {
            buffer,
            history,
            stroke: None,
            has_painted_with_brush: false,
            revision: 0,
        }
    }

    pub fn buffer(&self) -> &RasterBuffer {
        &self.buffer
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn has_painted_with_brush(&self) -> bool {
        self.has_painted_with_brush
    }

    /// Bumped whenever the working buffer's pixels change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn mark_modified(&mut self) {
        self.revision += 1;
    }

    /// Closes the open stroke and commits the buffer as a new snapshot
    fn finish_stroke(&mut self) -> Option<StrokeMode> {
        let stroke = self.stroke.take()?;
        let mode = stroke.mode();
        self.history.commit(self.buffer.snapshot());
        if mode == StrokeMode::Paint {
            self.has_painted_with_brush = true;
        }
        log::debug!(
            "Committed {:?} stroke ({} segments), history at {:?}/{}",
            mode,
            stroke.segments(),
            self.history.cursor(),
            self.history.len()
        );
        Some(mode)
    }

    /// Reloads the working buffer from the snapshot under the cursor
    fn reload_from_history(&mut self) {
        if let Some(current) = self.history.current() {
            self.buffer.load(current);
            self.mark_modified();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum EditState {
    #[default]
    Inactive,
    Active(Box<ActiveEdit>),
}

/// Inputs to the state machine
#[derive(Debug, Clone)]
pub enum EditAction {
    /// Start editing from `base`; refused when there is none
    Enter { base: Option<RasterSnapshot> },
    /// Leave edit mode, discarding every snapshot
    Cancel,
    /// Pointer pressed on the surface, in buffer coordinates
    PointerDown(Pos2),
    /// Pointer dragged, in buffer coordinates
    PointerMove(Pos2),
    PointerUp,
    /// Pointer left the drawable surface
    PointerLeave,
    Undo,
    Redo,
}

/// What an action did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered,
    /// `Enter` without a usable base image
    Refused,
    Cancelled,
    StrokeStarted,
    StrokeExtended,
    StrokeCommitted(StrokeMode),
    /// Undo or redo moved the history cursor
    HistoryMoved,
    /// The action does not apply in the current state
    Ignored,
}

/// The pixels and facts a generation request takes from a consumed session
#[derive(Debug, Clone)]
pub struct ConsumedEdit {
    pub source: RasterSnapshot,
    pub painted_with_brush: bool,
}

/// Tool settings persist with the app; the state itself never does
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSession {
    #[serde(skip)]
    state: EditState,
    pub tools: ToolSettings,
}

impl EditSession {
    pub fn new(tools: ToolSettings) -> Self {
        Self {
            state: EditState::Inactive,
            tools,
        }
    }

    /// The single transition function of the session
    pub fn apply(&mut self, action: EditAction) -> Transition {
        let (next, transition) = match (std::mem::take(&mut self.state), action) {
            (EditState::Inactive, EditAction::Enter { base: Some(base) }) => {
                log::info!("Entering edit mode on a {}x{} image", base.width(), base.height());
                (EditState::Active(Box::new(ActiveEdit::new(base))), Transition::Entered)
            }
            (EditState::Inactive, EditAction::Enter { base: None }) => {
                log::warn!("Edit refused: no base image available");
                (EditState::Inactive, Transition::Refused)
            }
            (EditState::Active(_), EditAction::Cancel) => {
                log::info!("Edit cancelled, discarding history");
                (EditState::Inactive, Transition::Cancelled)
            }
            (EditState::Active(mut edit), action) => {
                let transition = self.apply_active(&mut edit, action);
                (EditState::Active(edit), transition)
            }
            (state, _) => (state, Transition::Ignored),
        };
        self.state = next;
        transition
    }

    fn apply_active(&self, edit: &mut ActiveEdit, action: EditAction) -> Transition {
        match action {
            EditAction::PointerDown(point) => {
                // A press without a release in between closes the previous stroke first
                edit.finish_stroke();
                edit.stroke = Some(StrokeInProgress::begin(
                    point,
                    self.tools.brush_style(),
                    self.tools.stroke_mode(),
                ));
                Transition::StrokeStarted
            }
            EditAction::PointerMove(point) => match edit.stroke.as_mut() {
                Some(stroke) => {
                    stroke.extend(&mut edit.buffer, point);
                    edit.mark_modified();
                    Transition::StrokeExtended
                }
                None => Transition::Ignored,
            },
            EditAction::PointerUp | EditAction::PointerLeave => match edit.finish_stroke() {
                Some(mode) => Transition::StrokeCommitted(mode),
                None => Transition::Ignored,
            },
            EditAction::Undo | EditAction::Redo if edit.is_stroking() => Transition::Ignored,
            EditAction::Undo | EditAction::Redo => {
                let moved = match action {
                    EditAction::Undo => edit.history.undo(),
                    _ => edit.history.redo(),
                };
                if moved {
                    edit.reload_from_history();
                    Transition::HistoryMoved
                } else {
                    Transition::Ignored
                }
            }
            EditAction::Enter { .. } | EditAction::Cancel => Transition::Ignored,
        }
    }

    /// Takes the current snapshot for a generation request and leaves edit mode.
    ///
    /// Returns `None` when no session is active. The history itself is never
    /// touched; only the session is left.
    pub fn consume_for_generation(&mut self) -> Option<ConsumedEdit> {
        let EditState::Active(edit) = &self.state else {
            return None;
        };
        let consumed = edit.history.current().cloned().map(|source| ConsumedEdit {
            source,
            painted_with_brush: edit.has_painted_with_brush,
        });
        log::info!("Edit session consumed by generation");
        self.state = EditState::Inactive;
        consumed
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EditState::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveEdit> {
        match &self.state {
            EditState::Active(edit) => Some(edit),
            EditState::Inactive => None,
        }
    }

    /// The edit history, `None` while inactive
    pub fn history(&self) -> Option<&EditHistory> {
        self.active().map(ActiveEdit::history)
    }

    /// The snapshot a generation request would use right now
    pub fn current_snapshot(&self) -> Option<&RasterSnapshot> {
        self.history().and_then(EditHistory::current)
    }

    pub fn has_painted_with_brush(&self) -> bool {
        self.active().is_some_and(ActiveEdit::has_painted_with_brush)
    }

    pub fn can_undo(&self) -> bool {
        self.active().is_some_and(|edit| edit.history.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.active().is_some_and(|edit| edit.history.can_redo())
    }
}

/// Picks the image an edit session starts from.
///
/// The viewed generation result wins when there is one; a viewed slot that is
/// still pending means there is nothing to edit. Without any viewed result the
/// uploaded content image is used.
pub fn select_base_image(
    viewed: Option<&GenerationSlot>,
    content: Option<&RasterSnapshot>,
) -> Option<RasterSnapshot> {
    match viewed.map(GenerationSlot::state) {
        Some(SlotState::Ready(image)) => Some(image.after.clone()),
        Some(SlotState::Pending) => None,
        None => content.cloned(),
    }
}
