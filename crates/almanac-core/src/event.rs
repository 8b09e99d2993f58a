use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::Calendar;
use crate::datetime::{DateRange, Edge, iso_date_serde};
use crate::error::{CalendarError, Result};
use crate::filter::FilterPatch;
use crate::interaction::RangeEdit;
use crate::task::{Category, TaskId};

/// A task named by id, or by exact name when the id is not known up front
/// (recorded scripts, for example).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskRef {
    Id(TaskId),
    Name(String),
}

/// One inbound call from the presentation layer, as a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GestureEvent {
    BeginSelect {
        #[serde(with = "iso_date_serde")]
        day: NaiveDate,
    },
    ExtendSelect {
        #[serde(with = "iso_date_serde")]
        day: NaiveDate,
    },
    EndSelect,
    CancelSelect,
    BeginMove {
        task: TaskRef,
    },
    BeginResize {
        task: TaskRef,
        edge: Edge,
    },
    /// `day` is absent when the pointer was released outside the grid.
    Drop {
        #[serde(default, with = "iso_date_serde::option")]
        day: Option<NaiveDate>,
    },
    /// Without `start`/`end` the finished selection awaiting confirmation
    /// is used, never a drag still in progress; without
    /// `category` the configured default is used.
    Create {
        name: String,
        #[serde(default)]
        category: Option<Category>,
        #[serde(default, with = "iso_date_serde::option")]
        start: Option<NaiveDate>,
        #[serde(default, with = "iso_date_serde::option")]
        end: Option<NaiveDate>,
    },
    CancelCreation,
    CancelGesture,
    SetFilter(FilterPatch),
    ToggleCategory {
        category: Category,
    },
    SetVisibleMonth {
        #[serde(with = "iso_date_serde")]
        anchor: NaiveDate,
    },
    ShiftMonth {
        step: i32,
    },
}

impl GestureEvent {
    pub fn op_name(&self) -> &'static str {
        match self {
            GestureEvent::BeginSelect { .. } => "begin_select",
            GestureEvent::ExtendSelect { .. } => "extend_select",
            GestureEvent::EndSelect => "end_select",
            GestureEvent::CancelSelect => "cancel_select",
            GestureEvent::BeginMove { .. } => "begin_move",
            GestureEvent::BeginResize { .. } => "begin_resize",
            GestureEvent::Drop { .. } => "drop",
            GestureEvent::Create { .. } => "create",
            GestureEvent::CancelCreation => "cancel_creation",
            GestureEvent::CancelGesture => "cancel_gesture",
            GestureEvent::SetFilter(_) => "set_filter",
            GestureEvent::ToggleCategory { .. } => "toggle_category",
            GestureEvent::SetVisibleMonth { .. } => "set_visible_month",
            GestureEvent::ShiftMonth { .. } => "shift_month",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State changed with nothing further to report.
    Applied,
    /// The event did not apply in the current state.
    Ignored,
    CreationRequested(DateRange),
    Created(TaskId),
    Edited(RangeEdit),
}

fn applied_if(changed: bool) -> Outcome {
    if changed {
        Outcome::Applied
    } else {
        Outcome::Ignored
    }
}

impl Calendar {
    #[tracing::instrument(skip(self, event), fields(op = event.op_name()))]
    pub fn dispatch(&mut self, event: GestureEvent) -> Result<Outcome> {
        let outcome = match event {
            GestureEvent::BeginSelect { day } => {
                self.begin_select(day)?;
                Outcome::Applied
            }
            GestureEvent::ExtendSelect { day } => applied_if(self.extend_select(day)),
            GestureEvent::EndSelect => match self.end_select() {
                Some(request) => Outcome::CreationRequested(request.range),
                None => Outcome::Ignored,
            },
            GestureEvent::CancelSelect => applied_if(self.cancel_select()),
            GestureEvent::BeginMove { task } => {
                let id = self.resolve_task(&task)?;
                self.begin_move(id)?;
                Outcome::Applied
            }
            GestureEvent::BeginResize { task, edge } => {
                let id = self.resolve_task(&task)?;
                self.begin_resize(id, edge)?;
                Outcome::Applied
            }
            GestureEvent::Drop { day } => match self.drop_on(day) {
                Some(edit) => Outcome::Edited(edit),
                None => Outcome::Ignored,
            },
            GestureEvent::Create {
                name,
                category,
                start,
                end,
            } => {
                let (start, end) = match (start, end) {
                    (Some(start), Some(end)) => (start, end),
                    (None, None) => {
                        let range = self.awaiting_creation_range().ok_or_else(|| {
                            CalendarError::validation("no finished selection to create a task from")
                        })?;
                        (range.start, range.end)
                    }
                    _ => {
                        return Err(CalendarError::validation(
                            "start and end must be given together",
                        ));
                    }
                };
                let category = category.unwrap_or(self.config().default_category);
                let id = self.create(&name, category, start, end)?.id;
                Outcome::Created(id)
            }
            GestureEvent::CancelCreation => applied_if(self.cancel_creation()),
            GestureEvent::CancelGesture => applied_if(self.cancel_gesture()),
            GestureEvent::SetFilter(patch) => {
                self.set_filter(patch);
                Outcome::Applied
            }
            GestureEvent::ToggleCategory { category } => {
                self.toggle_category(category);
                Outcome::Applied
            }
            GestureEvent::SetVisibleMonth { anchor } => {
                self.set_visible_month(anchor);
                Outcome::Applied
            }
            GestureEvent::ShiftMonth { step } => {
                self.shift_month(step);
                Outcome::Applied
            }
        };

        debug!(?outcome, "event dispatched");
        Ok(outcome)
    }

    /// Ids pass through unchecked; a stale id is handled when the gesture
    /// drops. Names must match an existing task exactly.
    pub fn resolve_task(&self, task: &TaskRef) -> Result<TaskId> {
        match task {
            TaskRef::Id(id) => Ok(*id),
            TaskRef::Name(name) => self
                .tasks()
                .find_by_name(name)
                .map(|t| t.id)
                .ok_or_else(|| CalendarError::validation(format!("no task named {name:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalendarConfig;
    use crate::filter::MaxDuration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
    }

    #[test]
    fn events_parse_from_json() {
        let events: Vec<GestureEvent> = serde_json::from_str(
            r#"[
                {"op": "begin_select", "day": "2024-06-10"},
                {"op": "end_select"},
                {"op": "begin_resize", "task": "Design Review", "edge": "left"},
                {"op": "drop"},
                {"op": "set_filter", "query": "design", "max_duration": 7},
                {"op": "create", "name": "Budget", "category": "in-progress"}
            ]"#,
        )
        .expect("parse events");

        assert_eq!(events[0], GestureEvent::BeginSelect { day: day(10) });
        assert_eq!(
            events[2],
            GestureEvent::BeginResize {
                task: TaskRef::Name("Design Review".to_string()),
                edge: Edge::Left,
            }
        );
        assert_eq!(events[3], GestureEvent::Drop { day: None });
        assert_eq!(
            events[4],
            GestureEvent::SetFilter(FilterPatch {
                query: Some("design".to_string()),
                categories: None,
                max_duration: Some(MaxDuration::OneWeek),
            })
        );
        assert_eq!(
            events[5],
            GestureEvent::Create {
                name: "Budget".to_string(),
                category: Some(Category::InProgress),
                start: None,
                end: None,
            }
        );
    }

    #[test]
    fn task_ref_prefers_ids() {
        let id = TaskId::new();
        let parsed: TaskRef = serde_json::from_value(serde_json::json!(id.to_string())).expect("id");
        assert_eq!(parsed, TaskRef::Id(id));
    }

    #[test]
    fn create_without_range_uses_pending_selection() {
        let mut cal = Calendar::with_month(CalendarConfig::default(), day(1));
        cal.dispatch(GestureEvent::BeginSelect { day: day(10) }).expect("begin");
        cal.dispatch(GestureEvent::ExtendSelect { day: day(12) }).expect("extend");
        let requested = cal.dispatch(GestureEvent::EndSelect).expect("end");
        assert_eq!(requested, Outcome::CreationRequested(DateRange::new(day(10), day(12))));

        let created = cal
            .dispatch(GestureEvent::Create {
                name: "Design Review".to_string(),
                category: None,
                start: None,
                end: None,
            })
            .expect("create");
        let Outcome::Created(id) = created else {
            panic!("expected a created task, got {created:?}");
        };
        let task = cal.task(id).expect("stored");
        assert_eq!(task.category, Category::ToDo);
        assert_eq!(task.range(), DateRange::new(day(10), day(12)));
    }

    #[test]
    fn create_during_running_selection_is_rejected() {
        let mut cal = Calendar::with_month(CalendarConfig::default(), day(1));
        cal.dispatch(GestureEvent::BeginSelect { day: day(10) }).expect("begin");
        cal.dispatch(GestureEvent::ExtendSelect { day: day(12) }).expect("extend");

        let err = cal
            .dispatch(GestureEvent::Create {
                name: "Early".to_string(),
                category: None,
                start: None,
                end: None,
            })
            .expect_err("selection still running");
        assert!(err.is_validation());
        assert!(cal.tasks().is_empty());
        assert!(cal.is_drag_active());

        let requested = cal.dispatch(GestureEvent::EndSelect).expect("end");
        assert_eq!(requested, Outcome::CreationRequested(DateRange::new(day(10), day(12))));
        let created = cal
            .dispatch(GestureEvent::Create {
                name: "Late".to_string(),
                category: None,
                start: None,
                end: None,
            })
            .expect("create after end_select");
        assert!(matches!(created, Outcome::Created(_)));
        assert!(!cal.is_drag_active());
        assert_eq!(cal.pending_selection_range(), None);
        assert_eq!(cal.dispatch(GestureEvent::EndSelect).expect("end"), Outcome::Ignored);
        assert_eq!(cal.tasks().len(), 1);
    }

    #[test]
    fn create_without_range_or_selection_is_rejected() {
        let mut cal = Calendar::with_month(CalendarConfig::default(), day(1));
        let err = cal
            .dispatch(GestureEvent::Create {
                name: "Orphan".to_string(),
                category: None,
                start: None,
                end: None,
            })
            .expect_err("nothing selected");
        assert!(err.is_validation());
    }

    #[test]
    fn unknown_task_name_is_a_validation_error() {
        let mut cal = Calendar::with_month(CalendarConfig::default(), day(1));
        let err = cal
            .dispatch(GestureEvent::BeginMove {
                task: TaskRef::Name("Ghost".to_string()),
            })
            .expect_err("unknown");
        assert!(err.is_validation());
        assert!(!cal.is_drag_active());
    }

    #[test]
    fn idle_events_report_ignored() {
        let mut cal = Calendar::with_month(CalendarConfig::default(), day(1));
        assert_eq!(cal.dispatch(GestureEvent::EndSelect).expect("end"), Outcome::Ignored);
        assert_eq!(
            cal.dispatch(GestureEvent::Drop { day: Some(day(3)) }).expect("drop"),
            Outcome::Ignored
        );
        assert_eq!(cal.dispatch(GestureEvent::CancelGesture).expect("cancel"), Outcome::Ignored);
    }
}
