use std::collections::BTreeSet;

use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::datetime::case_insensitive_contains;
use crate::error::{
  CalendarError,
  Result
};
use crate::task::{
  Category,
  Task
};

/// Upper bound on a task's duration.
/// Encoded as its day count, `0` meaning
/// no bound.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(
  try_from = "u32",
  into = "u32"
)]
pub enum MaxDuration {
  #[default]
  Unbounded,
  OneWeek,
  TwoWeeks,
  ThreeWeeks
}

impl MaxDuration {
  #[must_use]
  pub fn days(self) -> u32 {
    match self {
      | MaxDuration::Unbounded => 0,
      | MaxDuration::OneWeek => 7,
      | MaxDuration::TwoWeeks => 14,
      | MaxDuration::ThreeWeeks => 21
    }
  }

  #[must_use]
  pub fn admits(
    self,
    duration_days: i64
  ) -> bool {
    match self {
      | MaxDuration::Unbounded => true,
      | bound => {
        duration_days
          <= i64::from(bound.days())
      }
    }
  }
}

impl TryFrom<u32> for MaxDuration {
  type Error = CalendarError;

  fn try_from(
    days: u32
  ) -> Result<Self> {
    match days {
      | 0 => Ok(MaxDuration::Unbounded),
      | 7 => Ok(MaxDuration::OneWeek),
      | 14 => Ok(MaxDuration::TwoWeeks),
      | 21 => {
        Ok(MaxDuration::ThreeWeeks)
      }
      | other => {
        Err(CalendarError::validation(
          format!(
            "max duration must be 0, \
             7, 14 or 21 days, got \
             {other}"
          )
        ))
      }
    }
  }
}

impl From<MaxDuration> for u32 {
  fn from(value: MaxDuration) -> Self {
    value.days()
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
pub struct FilterState {
  #[serde(default)]
  pub query:        String,
  #[serde(default)]
  pub categories:   BTreeSet<Category>,
  #[serde(default)]
  pub max_duration: MaxDuration
}

/// Partial update for [`FilterState`];
/// `None` leaves a field untouched.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
pub struct FilterPatch {
  #[serde(default)]
  pub query:        Option<String>,
  #[serde(default)]
  pub categories:
    Option<BTreeSet<Category>>,
  #[serde(default)]
  pub max_duration: Option<MaxDuration>
}

impl FilterState {
  #[must_use]
  pub fn apply(
    &self,
    patch: FilterPatch
  ) -> FilterState {
    FilterState {
      query:        patch
        .query
        .unwrap_or_else(|| {
          self.query.clone()
        }),
      categories:   patch
        .categories
        .unwrap_or_else(|| {
          self.categories.clone()
        }),
      max_duration: patch
        .max_duration
        .unwrap_or(self.max_duration)
    }
  }

  #[must_use]
  pub fn is_active(&self) -> bool {
    !self.query.is_empty()
      || !self.categories.is_empty()
      || self.max_duration
        != MaxDuration::Unbounded
  }

  #[must_use]
  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    let query_ok =
      case_insensitive_contains(
        &task.name,
        &self.query
      );
    let category_ok =
      self.categories.is_empty()
        || self
          .categories
          .contains(&task.category);
    let duration_ok = self
      .max_duration
      .admits(task.duration_days());

    trace!(
      task_id = %task.id,
      query_ok,
      category_ok,
      duration_ok,
      "filter decision"
    );
    query_ok
      && category_ok
      && duration_ok
  }
}

/// Order-preserving projection of
/// `tasks` through `filter`.
#[tracing::instrument(skip(
  tasks, filter
))]
pub fn visible_tasks<'a>(
  tasks: &'a [Task],
  filter: &FilterState
) -> Vec<&'a Task> {
  tasks
    .iter()
    .filter(|task| filter.matches(task))
    .collect()
}

/// Returns a new set with `category`
/// flipped; the input is untouched.
#[must_use]
pub fn toggle_category(
  set: &BTreeSet<Category>,
  category: Category
) -> BTreeSet<Category> {
  let mut next = set.clone();
  if !next.remove(&category) {
    next.insert(category);
  }
  next
}
