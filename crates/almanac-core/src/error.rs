use crate::task::TaskId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("another gesture is already in progress")]
    GestureInProgress,
}

impl CalendarError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, CalendarError>;
