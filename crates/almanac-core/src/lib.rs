//! Month-view calendar core: whole-day range arithmetic, the drag/selection
//! state machine, an in-memory task store and the filter projection.
//!
//! Front ends talk to [`Calendar`], either by calling its methods or by
//! sending [`GestureEvent`]s through [`Calendar::dispatch`].

pub mod calendar;
pub mod config;
pub mod datetime;
pub mod error;
pub mod event;
pub mod filter;
pub mod interaction;
pub mod store;
pub mod task;

pub use calendar::Calendar;
pub use config::CalendarConfig;
pub use datetime::{DateRange, Edge};
pub use error::{CalendarError, Result};
pub use event::{GestureEvent, Outcome, TaskRef};
pub use filter::{FilterPatch, FilterState, MaxDuration};
pub use interaction::{CreationRequest, DragContext, GestureOverlap, Interaction, RangeEdit};
pub use store::TaskStore;
pub use task::{Category, Task, TaskId};
