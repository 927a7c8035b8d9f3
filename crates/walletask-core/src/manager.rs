use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, info, warn};
use walletask_shared::{NewTask, Task, TaskId, TaskState};

use crate::error::{RemoteError, SyncError};
use crate::schedule::{compose_scheduled_time, display_order};
use crate::store::TaskStore;

/// Called after every local mutation so the view can re-render.
pub type Observer = Rc<dyn Fn()>;

/// The new-task form, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub date: String,
    pub time: String,
}

impl Draft {
    fn clear(&mut self) {
        self.text.clear();
        self.date.clear();
        self.time.clear();
    }
}

#[derive(Debug, Default)]
struct TaskListState {
    tasks: Vec<Task>,
    draft: Draft,
    selected: BTreeSet<TaskId>,
    revision: u64,
    state_updates: HashMap<TaskId, StateUpdates>,
    next_ticket: u64,
}

/// Bookkeeping for the state updates of one task that are still in flight.
#[derive(Debug, Default)]
struct StateUpdates {
    latest: u64,
    in_flight: usize,
    latest_failed: bool,
    // Newest update the store accepted.
    fallback: Option<(u64, TaskState)>,
}

/// What to do locally once a state update response arrives.
#[derive(Debug, PartialEq)]
enum Settled {
    Apply(TaskState),
    Keep,
}

impl TaskListState {
    fn issue_state_ticket(&mut self, id: TaskId) -> u64 {
        self.next_ticket += 1;
        let updates = self.state_updates.entry(id).or_default();
        updates.latest = self.next_ticket;
        updates.in_flight += 1;
        updates.latest_failed = false;
        self.next_ticket
    }

    /// Settles the response for `ticket`. The newest request wins when it
    /// succeeds; when it fails, the newest older request the store accepted
    /// is shown instead.
    fn settle_state_ticket(
        &mut self,
        id: TaskId,
        ticket: u64,
        accepted: Option<TaskState>,
    ) -> (bool, Settled) {
        let Some(updates) = self.state_updates.get_mut(&id) else {
            return (false, Settled::Keep);
        };
        updates.in_flight = updates.in_flight.saturating_sub(1);
        let latest = updates.latest == ticket;

        let settled = match (latest, accepted) {
            (true, Some(state)) => {
                updates.fallback = Some((ticket, state));
                Settled::Apply(state)
            }
            (true, None) => {
                updates.latest_failed = true;
                match updates.fallback {
                    Some((_, state)) => Settled::Apply(state),
                    None => Settled::Keep,
                }
            }
            (false, Some(state)) => {
                if updates.fallback.is_none_or(|(newest, _)| ticket > newest) {
                    updates.fallback = Some((ticket, state));
                }
                match (updates.latest_failed, updates.fallback) {
                    (true, Some((_, state))) => Settled::Apply(state),
                    _ => Settled::Keep,
                }
            }
            (false, None) => Settled::Keep,
        };

        if updates.in_flight == 0 {
            self.state_updates.remove(&id);
        }
        (latest, settled)
    }

    fn forget(&mut self, ids: &[TaskId]) {
        self.tasks.retain(|task| !ids.contains(&task.id));
        for id in ids {
            self.selected.remove(id);
        }
    }
}

/// Liveness of one mount of the task manager. Closed on unmount; every
/// response handler checks it before touching state.
#[derive(Debug, Clone)]
struct Scope(Rc<Cell<bool>>);

impl Scope {
    fn open() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    fn is_live(&self) -> bool {
        self.0.get()
    }

    fn close(&self) {
        self.0.set(false);
    }
}

/// Client-side task list kept in step with the remote store.
///
/// Cloning yields another handle to the same list, so a clone can be moved
/// into each spawned operation. Local state only changes after the store
/// answers successfully; failures are logged and otherwise ignored.
#[derive(Clone)]
pub struct TaskManager {
    store: Rc<dyn TaskStore>,
    state: Rc<RefCell<TaskListState>>,
    scope: Scope,
    observer: Option<Observer>,
}

impl fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TaskManager")
            .field("tasks", &state.tasks.len())
            .field("selected", &state.selected)
            .field("revision", &state.revision)
            .field("live", &self.scope.is_live())
            .finish()
    }
}

impl PartialEq for TaskManager {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl TaskManager {
    pub fn new(store: Rc<dyn TaskStore>) -> Self {
        Self {
            store,
            state: Rc::new(RefCell::new(TaskListState::default())),
            scope: Scope::open(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Tasks newest-created first, as the store returned them.
    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().tasks.clone()
    }

    /// Tasks in render order; see [`display_order`].
    pub fn display_tasks(&self) -> Vec<Task> {
        let state = self.state.borrow();
        display_order(&state.tasks).into_iter().cloned().collect()
    }

    pub fn draft(&self) -> Draft {
        self.state.borrow().draft.clone()
    }

    pub fn selected_ids(&self) -> BTreeSet<TaskId> {
        self.state.borrow().selected.clone()
    }

    pub fn is_selected(&self, id: TaskId) -> bool {
        self.state.borrow().selected.contains(&id)
    }

    pub fn has_selection(&self) -> bool {
        !self.state.borrow().selected.is_empty()
    }

    /// Bumped on every local mutation.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    pub fn is_live(&self) -> bool {
        self.scope.is_live()
    }

    /// Detaches this manager from the view. Responses that arrive later
    /// are dropped without touching state.
    pub fn unmount(&self) {
        if self.scope.is_live() {
            info!("unmounting task manager");
            self.scope.close();
        }
    }

    pub fn set_draft_text(&self, text: impl Into<String>) {
        self.mutate(|state| state.draft.text = text.into());
    }

    pub fn set_draft_date(&self, date: impl Into<String>) {
        self.mutate(|state| state.draft.date = date.into());
    }

    pub fn set_draft_time(&self, time: impl Into<String>) {
        self.mutate(|state| state.draft.time = time.into());
    }

    /// Replaces the local list with the store's contents.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Result<(), SyncError> {
        let result = self.store.list().await;
        self.ensure_live("load")?;
        let tasks = result.map_err(|err| self.report("load", err))?;
        info!(count = tasks.len(), "loaded tasks");
        self.mutate(|state| {
            let TaskListState {
                tasks: current,
                selected,
                ..
            } = state;
            *current = tasks;
            selected.retain(|id| current.iter().any(|task| task.id == *id));
        });
        Ok(())
    }

    /// Submits the draft as a new `Ready` task and clears the form.
    #[tracing::instrument(skip(self))]
    pub async fn add(&self) -> Result<(), SyncError> {
        let draft = self.draft();
        let text = draft.text.trim();
        if text.is_empty() {
            debug!("ignored add with empty task text");
            return Err(SyncError::EmptyText);
        }

        let scheduled_time = compose_scheduled_time(&draft.date, &draft.time).map_err(|err| {
            warn!(error = %err, "rejected draft schedule");
            SyncError::from(err)
        })?;

        let new_task = NewTask {
            text: text.to_string(),
            scheduled_time,
            state: TaskState::Ready,
        };

        let result = self.store.insert(&new_task).await;
        self.ensure_live("add")?;
        let created = result.map_err(|err| self.report("add", err))?;

        info!(id = created.id, "created task");
        self.mutate(|state| {
            state.tasks.insert(0, created);
            state.draft.clear();
        });
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: TaskId) -> Result<(), SyncError> {
        let result = self.store.delete(id).await;
        self.ensure_live("remove")?;
        result.map_err(|err| self.report("remove", err))?;

        info!(id, "removed task");
        self.mutate(|state| state.forget(&[id]));
        Ok(())
    }

    /// Sets a task's state. When several updates for one task overlap, the
    /// most recently issued one is shown if the store accepts it; if it is
    /// rejected, the newest older update the store accepted is shown instead.
    /// Older updates report `Superseded` either way.
    #[tracing::instrument(skip(self))]
    pub async fn update_state(&self, id: TaskId, new_state: TaskState) -> Result<(), SyncError> {
        let ticket = self.state.borrow_mut().issue_state_ticket(id);
        let result = self.store.update_state(id, new_state).await;
        self.ensure_live("update_state")?;

        let accepted = result.as_ref().ok().map(|_| new_state);
        let (latest, settled) = self
            .state
            .borrow_mut()
            .settle_state_ticket(id, ticket, accepted);
        if let Settled::Apply(shown) = settled {
            debug!(id, ticket, state = %shown, "applying acknowledged state");
            self.mutate(|state| {
                if let Some(task) = state.tasks.iter_mut().find(|task| task.id == id) {
                    task.state = shown;
                }
            });
        }

        let row = result.map_err(|err| self.report("update_state", err))?;
        if !latest {
            debug!(id, ticket, "state update superseded by a newer request");
            return Err(SyncError::Superseded(id));
        }
        debug!(id, stored = %row.state, "state update acknowledged");
        Ok(())
    }

    /// Flips `id` in the selection. Ids not in the list are ignored.
    pub fn toggle_select(&self, id: TaskId) {
        self.mutate(|state| {
            if !state.selected.remove(&id) {
                if state.tasks.iter().any(|task| task.id == id) {
                    state.selected.insert(id);
                } else {
                    debug!(id, "ignored selection of unknown task");
                }
            }
        });
    }

    /// Deletes every selected task in one call and clears the selection.
    #[tracing::instrument(skip(self))]
    pub async fn bulk_delete(&self) -> Result<(), SyncError> {
        let ids: Vec<TaskId> = self.state.borrow().selected.iter().copied().collect();
        if ids.is_empty() {
            debug!("bulk delete with nothing selected");
            return Ok(());
        }

        let result = self.store.delete_many(&ids).await;
        self.ensure_live("bulk_delete")?;
        result.map_err(|err| self.report("bulk_delete", err))?;

        info!(count = ids.len(), "bulk deleted tasks");
        self.mutate(|state| {
            state.forget(&ids);
            state.selected.clear();
        });
        Ok(())
    }

    fn ensure_live(&self, op: &'static str) -> Result<(), SyncError> {
        if self.scope.is_live() {
            Ok(())
        } else {
            debug!(op, "dropping response for unmounted task manager");
            Err(SyncError::Unmounted)
        }
    }

    fn report(&self, op: &'static str, err: RemoteError) -> SyncError {
        error!(op, error = %err, "task store call failed");
        SyncError::Remote(err)
    }

    fn mutate(&self, apply: impl FnOnce(&mut TaskListState)) {
        {
            let mut state = self.state.borrow_mut();
            apply(&mut state);
            state.revision += 1;
        }
        if let Some(observer) = &self.observer {
            observer();
        }
    }
}
