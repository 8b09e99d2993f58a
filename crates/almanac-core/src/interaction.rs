use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::datetime::{DateRange, Edge, format_iso, move_keeping_length, set_edge};
use crate::error::{CalendarError, Result};
use crate::store::TaskStore;
use crate::task::TaskId;

/// What a `begin_*` call does while another gesture is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureOverlap {
    /// Cancel the active gesture and start the new one.
    #[default]
    Restart,
    /// Refuse the new gesture with [`CalendarError::GestureInProgress`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragContext {
    #[default]
    Idle,
    /// Raw gesture endpoints; `anchor` is where the pointer went down.
    Selecting { anchor: NaiveDate, current: NaiveDate },
    Moving { task_id: TaskId },
    Resizing { task_id: TaskId, edge: Edge },
}

/// Emitted when a select gesture finishes; opens the task-entry flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationRequest {
    pub range: DateRange,
}

/// Range change for one task, computed from a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEdit {
    pub task_id: TaskId,
    pub range: DateRange,
}

/// Single-slot gesture tracker. All gesture state lives here; the
/// presentation layer keeps none of its own.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    context: DragContext,
    awaiting_confirmation: Option<DateRange>,
    overlap: GestureOverlap,
}

impl Interaction {
    pub fn new(overlap: GestureOverlap) -> Self {
        Self {
            overlap,
            ..Self::default()
        }
    }

    pub fn context(&self) -> DragContext {
        self.context
    }

    pub fn overlap(&self) -> GestureOverlap {
        self.overlap
    }

    pub fn is_drag_active(&self) -> bool {
        self.context != DragContext::Idle
    }

    /// The clamped range being picked, or the one waiting for confirmation.
    pub fn pending_selection(&self) -> Option<DateRange> {
        match self.context {
            DragContext::Selecting { anchor, current } => Some(DateRange::new(anchor, current)),
            _ => self.awaiting_confirmation,
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn begin_select(&mut self, day: NaiveDate) -> Result<()> {
        self.enter(DragContext::Selecting {
            anchor: day,
            current: day,
        })?;
        self.awaiting_confirmation = None;
        debug!(day = %format_iso(day), "selection started");
        Ok(())
    }

    pub fn extend_select(&mut self, day: NaiveDate) -> bool {
        match &mut self.context {
            DragContext::Selecting { current, .. } => {
                *current = day;
                trace!(day = %format_iso(day), "selection extended");
                true
            }
            other => {
                trace!(context = ?other, "extend ignored outside selection");
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn end_select(&mut self) -> Option<CreationRequest> {
        let DragContext::Selecting { anchor, current } = self.context else {
            trace!(context = ?self.context, "end_select ignored outside selection");
            return None;
        };

        let range = DateRange::new(anchor, current);
        self.context = DragContext::Idle;
        self.awaiting_confirmation = Some(range);
        debug!(%range, "selection finished; creation requested");
        Some(CreationRequest { range })
    }

    pub fn cancel_select(&mut self) -> bool {
        if !matches!(self.context, DragContext::Selecting { .. }) {
            return false;
        }
        self.context = DragContext::Idle;
        debug!("selection cancelled");
        true
    }

    /// The range from a finished select that has not been confirmed or
    /// dismissed yet. Never the live range of a running drag.
    pub fn awaiting_confirmation(&self) -> Option<DateRange> {
        self.awaiting_confirmation
    }

    pub fn confirm_creation(&mut self) -> Option<DateRange> {
        self.awaiting_confirmation.take()
    }

    pub fn cancel_creation(&mut self) -> bool {
        let had = self.awaiting_confirmation.take().is_some();
        if had {
            debug!("creation flow dismissed");
        }
        had
    }

    #[tracing::instrument(skip(self), fields(task_id = %task_id))]
    pub fn begin_move(&mut self, task_id: TaskId) -> Result<()> {
        self.enter(DragContext::Moving { task_id })?;
        debug!("move started");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(task_id = %task_id))]
    pub fn begin_resize(&mut self, task_id: TaskId, edge: Edge) -> Result<()> {
        self.enter(DragContext::Resizing { task_id, edge })?;
        debug!(?edge, "resize started");
        Ok(())
    }

    /// Drops whatever gesture is active without producing an edit.
    pub fn cancel(&mut self) -> bool {
        let previous = std::mem::take(&mut self.context);
        if previous == DragContext::Idle {
            return false;
        }
        debug!(?previous, "gesture cancelled");
        true
    }

    /// Finishes a move or resize. `target` is `None` when the pointer was
    /// released outside every day cell; that cancels the gesture. The drag
    /// context is cleared either way.
    #[tracing::instrument(skip(self, store))]
    pub fn drop_on(&mut self, target: Option<NaiveDate>, store: &TaskStore) -> Option<RangeEdit> {
        let (task_id, edge) = match self.context {
            DragContext::Moving { task_id } => (task_id, None),
            DragContext::Resizing { task_id, edge } => (task_id, Some(edge)),
            other => {
                trace!(context = ?other, "drop ignored outside move/resize");
                return None;
            }
        };
        self.context = DragContext::Idle;

        let Some(day) = target else {
            debug!(task_id = %task_id, "dropped outside the grid; gesture cancelled");
            return None;
        };

        let Some(task) = store.get(task_id) else {
            warn!(task_id = %task_id, "drop referenced a missing task; ignoring");
            return None;
        };

        let range = match edge {
            None => move_keeping_length(day, task.range()),
            Some(edge) => set_edge(edge, day, task.range()),
        };
        debug!(task_id = %task_id, ?edge, %range, "drop computed range edit");
        Some(RangeEdit { task_id, range })
    }

    fn enter(&mut self, next: DragContext) -> Result<()> {
        if self.context != DragContext::Idle {
            match self.overlap {
                GestureOverlap::Reject => {
                    debug!(active = ?self.context, "rejecting overlapping gesture");
                    return Err(CalendarError::GestureInProgress);
                }
                GestureOverlap::Restart => {
                    debug!(active = ?self.context, "restarting over active gesture");
                }
            }
        }
        self.context = next;
        Ok(())
    }
}
