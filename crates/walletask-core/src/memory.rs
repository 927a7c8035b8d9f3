use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use futures::channel::oneshot;
use tracing::{debug, trace};
use walletask_shared::{NewTask, Task, TaskId, TaskState};

use crate::error::RemoteError;
use crate::store::TaskStore;

// 2024-01-01T00:00:00Z; rows are stamped one second apart from here.
const EPOCH_SECS: i64 = 1_704_067_200;

/// In-process `TaskStore`.
///
/// Backs the page when no hosted database is configured, and gives tests
/// a fake with call counting, failure injection and held responses.
/// Mutations are applied when the call is made; holding only delays the
/// response, the way a slow network would.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    inner: RefCell<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<Task>,
    next_id: TaskId,
    calls: usize,
    failure: Option<RemoteError>,
    holding: bool,
    held: VecDeque<oneshot::Sender<()>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds rows as if they had been inserted in the given order.
    pub fn with_rows(rows: Vec<Task>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.borrow_mut();
            for mut row in rows {
                if row.created_at.is_none() {
                    row.created_at = stamp(row.id);
                }
                inner.next_id = inner.next_id.max(row.id);
                inner.rows.push(row);
            }
        }
        store
    }

    /// Rows currently stored, in insertion order.
    pub fn rows(&self) -> Vec<Task> {
        self.inner.borrow().rows.clone()
    }

    /// Number of remote calls received so far.
    pub fn calls(&self) -> usize {
        self.inner.borrow().calls
    }

    /// Every following call fails with `message` until `recover`.
    pub fn fail_with(&self, message: &str) {
        self.inner.borrow_mut().failure = Some(RemoteError::new(message));
    }

    pub fn recover(&self) {
        self.inner.borrow_mut().failure = None;
    }

    /// Following calls wait for an explicit release before answering.
    pub fn hold_responses(&self) {
        self.inner.borrow_mut().holding = true;
    }

    pub fn held_count(&self) -> usize {
        self.inner.borrow().held.len()
    }

    /// Answers the oldest held call.
    pub fn release_first(&self) -> bool {
        let sender = self.inner.borrow_mut().held.pop_front();
        sender.is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Answers the most recent held call.
    pub fn release_last(&self) -> bool {
        let sender = self.inner.borrow_mut().held.pop_back();
        sender.is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Answers every held call and stops holding new ones.
    pub fn release_all(&self) {
        let held: Vec<_> = {
            let mut inner = self.inner.borrow_mut();
            inner.holding = false;
            inner.held.drain(..).collect()
        };
        for tx in held {
            let _ = tx.send(());
        }
    }

    fn begin(&self, op: &'static str) -> Result<(), RemoteError> {
        let mut inner = self.inner.borrow_mut();
        inner.calls += 1;
        trace!(op, call = inner.calls, "memory store call");
        match &inner.failure {
            Some(err) => {
                debug!(op, error = %err, "injected failure");
                Err(err.clone())
            }
            None => Ok(()),
        }
    }

    async fn respond<T>(&self, outcome: Result<T, RemoteError>) -> Result<T, RemoteError> {
        let gate = {
            let mut inner = self.inner.borrow_mut();
            if inner.holding {
                let (tx, rx) = oneshot::channel();
                inner.held.push_back(tx);
                Some(rx)
            } else {
                None
            }
        };
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        outcome
    }

    fn apply_insert(&self, task: &NewTask) -> Task {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let row = Task {
            id: inner.next_id,
            text: task.text.clone(),
            scheduled_time: task.scheduled_time,
            state: task.state,
            created_at: stamp(inner.next_id),
        };
        inner.rows.push(row.clone());
        row
    }

    fn apply_update(&self, id: TaskId, state: TaskState) -> Result<Task, RemoteError> {
        let mut inner = self.inner.borrow_mut();
        let row = inner
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| RemoteError::new(format!("update returned no rows for id {id}")))?;
        row.state = state;
        Ok(row.clone())
    }
}

fn stamp(id: TaskId) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(EPOCH_SECS + id, 0).map(|dt| dt.naive_utc())
}

#[async_trait(?Send)]
impl TaskStore for MemoryTaskStore {
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        let outcome = self.begin("list").map(|()| {
            let mut rows = self.rows();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            rows
        });
        self.respond(outcome).await
    }

    async fn insert(&self, task: &NewTask) -> Result<Task, RemoteError> {
        let outcome = self.begin("insert").map(|()| self.apply_insert(task));
        self.respond(outcome).await
    }

    async fn update_state(&self, id: TaskId, state: TaskState) -> Result<Task, RemoteError> {
        let outcome = self
            .begin("update")
            .and_then(|()| self.apply_update(id, state));
        self.respond(outcome).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), RemoteError> {
        let outcome = self.begin("delete").map(|()| {
            self.inner.borrow_mut().rows.retain(|row| row.id != id);
        });
        self.respond(outcome).await
    }

    async fn delete_many(&self, ids: &[TaskId]) -> Result<(), RemoteError> {
        let outcome = self.begin("bulk delete").map(|()| {
            self.inner
                .borrow_mut()
                .rows
                .retain(|row| !ids.contains(&row.id));
        });
        self.respond(outcome).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn new_task(text: &str) -> NewTask {
        NewTask {
            text: text.to_string(),
            scheduled_time: None,
            state: TaskState::Ready,
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids_and_lists_newest_first() {
        let store = MemoryTaskStore::new();
        let first = store.insert(&new_task("first")).await.expect("insert");
        let second = store.insert(&new_task("second")).await.expect("insert");
        assert!(second.id > first.id);

        let listed: Vec<String> = store
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(listed, vec!["second".to_string(), "first".to_string()]);
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn seeded_rows_continue_the_id_sequence() {
        let store = MemoryTaskStore::with_rows(vec![Task {
            id: 41,
            text: "seed".to_string(),
            scheduled_time: None,
            state: TaskState::InReview,
            created_at: None,
        }]);
        let row = store.insert(&new_task("next")).await.expect("insert");
        assert_eq!(row.id, 42);
    }

    #[tokio::test]
    async fn injected_failure_leaves_rows_alone() {
        let store = MemoryTaskStore::new();
        store.fail_with("offline");
        let err = store.insert(&new_task("lost")).await.expect_err("fails");
        assert_eq!(err, RemoteError::new("offline"));
        assert!(store.rows().is_empty());

        store.recover();
        assert!(store.insert(&new_task("kept")).await.is_ok());
    }

    #[tokio::test]
    async fn updating_a_missing_row_fails() {
        let store = MemoryTaskStore::new();
        assert!(store.update_state(9, TaskState::Completed).await.is_err());
    }

    #[tokio::test]
    async fn held_calls_wait_for_release() {
        let store = MemoryTaskStore::new();
        store.hold_responses();

        let (listed, ()) = tokio::join!(store.list(), async {
            while store.held_count() < 1 {
                tokio::task::yield_now().await;
            }
            store.release_all();
        });
        assert!(listed.expect("list").is_empty());
    }
}
