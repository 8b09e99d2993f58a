use std::collections::BTreeSet;

use chrono::{
  Datelike,
  NaiveDate
};
use tracing::{
  debug,
  warn
};

use crate::config::CalendarConfig;
use crate::datetime::{
  DateRange,
  Edge,
  first_day_of_month,
  format_iso,
  month_grid,
  shift_months
};
use crate::error::{
  CalendarError,
  Result
};
use crate::filter::{
  FilterPatch,
  FilterState,
  toggle_category,
  visible_tasks
};
use crate::interaction::{
  CreationRequest,
  Interaction,
  RangeEdit
};
use crate::store::TaskStore;
use crate::task::{
  Category,
  Task,
  TaskId
};

/// The object a presentation layer
/// drives: it owns the tasks, the
/// gesture state, the filter and the
/// visible month.
#[derive(Debug, Clone)]
pub struct Calendar {
  config:      CalendarConfig,
  store:       TaskStore,
  interaction: Interaction,
  filter:      FilterState,
  month:       NaiveDate
}

impl Calendar {
  /// Opens on the current month in the
  /// configured timezone.
  #[must_use]
  pub fn new(
    config: CalendarConfig
  ) -> Self {
    let today = config.today();
    Self::with_month(config, today)
  }

  #[must_use]
  pub fn with_month(
    config: CalendarConfig,
    anchor: NaiveDate
  ) -> Self {
    let interaction = Interaction::new(
      config.gesture_overlap()
    );
    Self {
      config,
      store: TaskStore::new(),
      interaction,
      filter: FilterState::default(),
      month: first_day_of_month(
        anchor.year(),
        anchor.month()
      )
    }
  }

  // Gestures.

  pub fn begin_select(
    &mut self,
    day: NaiveDate
  ) -> Result<()> {
    self.interaction.begin_select(day)
  }

  pub fn extend_select(
    &mut self,
    day: NaiveDate
  ) -> bool {
    self.interaction.extend_select(day)
  }

  pub fn end_select(
    &mut self
  ) -> Option<CreationRequest> {
    self.interaction.end_select()
  }

  pub fn cancel_select(
    &mut self
  ) -> bool {
    self.interaction.cancel_select()
  }

  pub fn cancel_creation(
    &mut self
  ) -> bool {
    self.interaction.cancel_creation()
  }

  pub fn cancel_gesture(
    &mut self
  ) -> bool {
    self.interaction.cancel()
  }

  pub fn begin_move(
    &mut self,
    task_id: TaskId
  ) -> Result<()> {
    self.interaction.begin_move(task_id)
  }

  pub fn begin_resize(
    &mut self,
    task_id: TaskId,
    edge: Edge
  ) -> Result<()> {
    self
      .interaction
      .begin_resize(task_id, edge)
  }

  /// Finishes a move or resize and
  /// writes the result to the store.
  /// Stale task ids are ignored.
  #[tracing::instrument(skip(self))]
  pub fn drop_on(
    &mut self,
    target: Option<NaiveDate>
  ) -> Option<RangeEdit> {
    let edit = self
      .interaction
      .drop_on(target, &self.store)?;
    match self.store.apply_range_edit(
      edit.task_id,
      edit.range.start,
      edit.range.end
    ) {
      | Ok(_) => Some(edit),
      | Err(CalendarError::NotFound(
        id
      )) => {
        warn!(
          task_id = %id,
          "range edit for missing task \
           ignored"
        );
        None
      }
      | Err(err) => {
        warn!(
          error = %err,
          "range edit rejected"
        );
        None
      }
    }
  }

  // Store.

  /// Stores a task. When its range is
  /// the one awaiting confirmation the
  /// task-entry flow is confirmed too;
  /// any other range leaves it alone. On
  /// failure nothing changes.
  #[tracing::instrument(skip(self, name))]
  pub fn create(
    &mut self,
    name: &str,
    category: Category,
    start: NaiveDate,
    end: NaiveDate
  ) -> Result<&Task> {
    let (id, range) = {
      let task = self.store.create(
        name, category, start, end
      )?;
      (task.id, task.range())
    };
    if self
      .interaction
      .awaiting_confirmation()
      == Some(range)
    {
      self.interaction.confirm_creation();
    }
    self.store.get(id).ok_or(
      CalendarError::NotFound(id)
    )
  }

  /// The finished selection waiting for
  /// a name, if any.
  #[must_use]
  pub fn awaiting_creation_range(
    &self
  ) -> Option<DateRange> {
    self.interaction.awaiting_confirmation()
  }

  // Filter and viewport.

  pub fn set_filter(
    &mut self,
    patch: FilterPatch
  ) {
    self.filter =
      self.filter.apply(patch);
    debug!(
      filter = ?self.filter,
      "filter updated"
    );
  }

  pub fn toggle_category(
    &mut self,
    category: Category
  ) {
    let categories = toggle_category(
      &self.filter.categories,
      category
    );
    self.set_filter(FilterPatch {
      categories: Some(categories),
      ..FilterPatch::default()
    });
  }

  pub fn set_visible_month(
    &mut self,
    anchor: NaiveDate
  ) {
    self.month = first_day_of_month(
      anchor.year(),
      anchor.month()
    );
    debug!(
      month = %format_iso(self.month),
      "visible month changed"
    );
  }

  pub fn shift_month(
    &mut self,
    step: i32
  ) {
    let next =
      shift_months(self.month, step);
    self.set_visible_month(next);
  }

  // Read side.

  #[must_use]
  pub fn current_month_grid(
    &self
  ) -> Vec<NaiveDate> {
    month_grid(
      self.month,
      self.config.week_start()
    )
  }

  #[must_use]
  pub fn visible_tasks(
    &self
  ) -> Vec<&Task> {
    visible_tasks(
      self.store.as_slice(),
      &self.filter
    )
  }

  /// Visible tasks covering `day`.
  #[must_use]
  pub fn visible_tasks_on(
    &self,
    day: NaiveDate
  ) -> Vec<&Task> {
    self
      .store
      .tasks_on(day)
      .filter(|task| {
        self.filter.matches(task)
      })
      .collect()
  }

  #[must_use]
  pub fn pending_selection_range(
    &self
  ) -> Option<DateRange> {
    self.interaction.pending_selection()
  }

  #[must_use]
  pub fn is_drag_active(&self) -> bool {
    self.interaction.is_drag_active()
  }

  #[must_use]
  pub fn visible_month(
    &self
  ) -> NaiveDate {
    self.month
  }

  #[must_use]
  pub fn tasks(&self) -> &TaskStore {
    &self.store
  }

  #[must_use]
  pub fn task(
    &self,
    id: TaskId
  ) -> Option<&Task> {
    self.store.get(id)
  }

  #[must_use]
  pub fn filter(&self) -> &FilterState {
    &self.filter
  }

  #[must_use]
  pub fn config(
    &self
  ) -> &CalendarConfig {
    &self.config
  }

  #[must_use]
  pub fn active_categories(
    &self
  ) -> &BTreeSet<Category> {
    &self.filter.categories
  }
}
