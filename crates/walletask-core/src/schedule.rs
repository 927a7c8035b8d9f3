use chrono::{
  NaiveDate,
  NaiveDateTime,
  NaiveTime
};
use thiserror::Error;
use tracing::debug;
use walletask_shared::Task;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] =
  ["%H:%M:%S", "%H:%M"];
const DISPLAY_FORMAT: &str =
  "%Y-%m-%d %H:%M";

#[derive(
  Debug, Clone, PartialEq, Eq, Error,
)]
pub enum ScheduleError {
  #[error("invalid date: {0}")]
  InvalidDate(String),
  #[error("invalid time: {0}")]
  InvalidTime(String)
}

/// Combines the date and time draft
/// fields into one timestamp.
///
/// Both halves are required: a date
/// without a time (or a time without a
/// date) yields `None` and the lone
/// half is dropped.
pub fn compose_scheduled_time(
  date: &str,
  time: &str
) -> Result<Option<NaiveDateTime>, ScheduleError>
{
  let date = date.trim();
  let time = time.trim();

  if date.is_empty() || time.is_empty()
  {
    if !date.is_empty()
      || !time.is_empty()
    {
      debug!(
        date,
        time,
        "discarding partial schedule"
      );
    }
    return Ok(None);
  }

  let day = NaiveDate::parse_from_str(
    date,
    DATE_FORMAT
  )
  .map_err(|_| {
    ScheduleError::InvalidDate(
      date.to_string()
    )
  })?;

  let clock = TIME_FORMATS
    .iter()
    .find_map(|fmt| {
      NaiveTime::parse_from_str(
        time, fmt
      )
      .ok()
    })
    .ok_or_else(|| {
      ScheduleError::InvalidTime(
        time.to_string()
      )
    })?;

  Ok(Some(day.and_time(clock)))
}

/// Orders tasks for rendering: earliest
/// scheduled first, unscheduled last.
/// The sort is stable, so unscheduled
/// tasks keep their relative order.
#[must_use]
pub fn display_order(
  tasks: &[Task]
) -> Vec<&Task> {
  let mut ordered: Vec<&Task> =
    tasks.iter().collect();
  ordered.sort_by_key(|task| {
    (
      task.scheduled_time.is_none(),
      task.scheduled_time
    )
  });
  ordered
}

#[must_use]
pub fn format_for_display(
  dt: &NaiveDateTime
) -> String {
  dt.format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use walletask_shared::{
    TaskState,
    row_time
  };

  use super::*;

  fn task(
    id: i64,
    scheduled: Option<&str>
  ) -> Task {
    Task {
      id,
      text: format!("task {id}"),
      scheduled_time: scheduled
        .and_then(row_time::parse),
      state: TaskState::Ready,
      created_at: None
    }
  }

  #[test]
  fn date_and_time_combine() {
    let combined =
      compose_scheduled_time(
        "2024-01-01",
        "09:00"
      )
      .expect("valid draft");
    assert_eq!(
      combined,
      row_time::parse("2024-01-01T09:00")
    );
  }

  #[test]
  fn seconds_are_accepted() {
    let combined =
      compose_scheduled_time(
        "2024-01-01",
        "09:00:30"
      )
      .expect("valid draft");
    assert_eq!(
      combined,
      row_time::parse(
        "2024-01-01T09:00:30"
      )
    );
  }

  #[test]
  fn lone_half_is_dropped() {
    assert_eq!(
      compose_scheduled_time(
        "2024-01-01",
        ""
      ),
      Ok(None)
    );
    assert_eq!(
      compose_scheduled_time(
        "", "09:00"
      ),
      Ok(None)
    );
    assert_eq!(
      compose_scheduled_time(
        "  ", "  "
      ),
      Ok(None)
    );
  }

  #[test]
  fn malformed_halves_are_rejected() {
    assert_eq!(
      compose_scheduled_time(
        "01/02/2024",
        "09:00"
      ),
      Err(ScheduleError::InvalidDate(
        "01/02/2024".to_string()
      ))
    );
    assert_eq!(
      compose_scheduled_time(
        "2024-01-02",
        "9am"
      ),
      Err(ScheduleError::InvalidTime(
        "9am".to_string()
      ))
    );
  }

  #[test]
  fn unscheduled_tasks_sort_last_in_original_order(
  ) {
    let tasks = vec![
      task(1, None),
      task(2, Some("2024-03-01T10:00")),
      task(3, None),
      task(4, Some("2024-01-01T09:00")),
    ];

    let ids: Vec<i64> =
      display_order(&tasks)
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![4, 2, 1, 3]);
  }

  #[test]
  fn display_order_leaves_input_alone()
  {
    let tasks = vec![
      task(1, Some("2024-05-01T10:00")),
      task(2, Some("2024-01-01T09:00")),
    ];
    let before = tasks.clone();
    let _ = display_order(&tasks);
    assert_eq!(tasks, before);
  }

  #[test]
  fn equal_times_keep_list_order() {
    let tasks = vec![
      task(9, Some("2024-01-01T09:00")),
      task(3, Some("2024-01-01T09:00")),
    ];
    let ids: Vec<i64> =
      display_order(&tasks)
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![9, 3]);
  }

  #[test]
  fn display_format_is_minute_precision(
  ) {
    let dt = row_time::parse(
      "2024-01-01T09:05:59"
    )
    .expect("valid timestamp");
    assert_eq!(
      format_for_display(&dt),
      "2024-01-01 09:05"
    );
  }
}
