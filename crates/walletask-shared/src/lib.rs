use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{
  Deserialize,
  Serialize
};

pub mod row_time;

/// Row id assigned by the hosted
/// database.
pub type TaskId = i64;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
pub enum TaskState {
  #[default]
  Ready,
  #[serde(rename = "In Progress")]
  InProgress,
  #[serde(rename = "In Review")]
  InReview,
  Completed
}

impl TaskState {
  pub const ALL: [TaskState; 4] = [
    TaskState::Ready,
    TaskState::InProgress,
    TaskState::InReview,
    TaskState::Completed
  ];

  /// Label stored in the `state`
  /// column and shown in the picker.
  pub fn label(self) -> &'static str {
    match self {
      | TaskState::Ready => "Ready",
      | TaskState::InProgress => {
        "In Progress"
      }
      | TaskState::InReview => {
        "In Review"
      }
      | TaskState::Completed => {
        "Completed"
      }
    }
  }
}

impl fmt::Display for TaskState {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
  thiserror::Error,
)]
#[error("unknown task state: {0}")]
pub struct UnknownTaskState(pub String);

impl FromStr for TaskState {
  type Err = UnknownTaskState;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    TaskState::ALL
      .into_iter()
      .find(|state| {
        state.label() == s.trim()
      })
      .ok_or_else(|| {
        UnknownTaskState(s.to_string())
      })
  }
}

/// One row of the `tasks` table.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Task {
  pub id:             TaskId,
  pub text:           String,
  #[serde(
    default,
    with = "row_time::option"
  )]
  pub scheduled_time:
    Option<NaiveDateTime>,
  #[serde(default)]
  pub state:          TaskState,
  #[serde(
    default,
    with = "row_time::option",
    skip_serializing_if = "Option::is_none"
  )]
  pub created_at:
    Option<NaiveDateTime>
}

/// Insert payload; the database fills
/// in `id` and `created_at`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct NewTask {
  pub text:           String,
  #[serde(
    default,
    with = "row_time::option"
  )]
  pub scheduled_time:
    Option<NaiveDateTime>,
  pub state:          TaskState
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct StatePatch {
  pub state: TaskState
}
