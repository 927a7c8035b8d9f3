use thiserror::Error;
use walletask_shared::TaskId;

use crate::schedule::ScheduleError;

/// The single failure kind of the task
/// store. Network errors, rejected
/// requests and undecodable bodies all
/// end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote call failed: {message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("undecodable response: {err}"))
    }
}

/// Why a task manager operation left local state untouched.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("task text is empty")]
    EmptyText,

    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("task manager was unmounted before the response arrived")]
    Unmounted,

    #[error("state update for task {0} was superseded by a newer request")]
    Superseded(TaskId),
}
