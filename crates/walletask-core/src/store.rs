use std::rc::Rc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::info;
use walletask_shared::{NewTask, Task, TaskId, TaskState};

use crate::config::StoreConfig;
use crate::error::RemoteError;
use crate::memory::MemoryTaskStore;
use crate::rest::RestTaskStore;

/// Row CRUD against the `tasks` table.
///
/// Each method is exactly one remote call. Futures are not `Send`: the
/// store lives on the browser's single thread.
#[async_trait(?Send)]
pub trait TaskStore {
    /// All rows, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Task>, RemoteError>;

    /// Inserts one row and returns it as stored (with its id).
    async fn insert(&self, task: &NewTask) -> Result<Task, RemoteError>;

    /// Sets `state` on the row with `id` and returns the updated row.
    async fn update_state(&self, id: TaskId, state: TaskState) -> Result<Task, RemoteError>;

    async fn delete(&self, id: TaskId) -> Result<(), RemoteError>;

    /// Deletes every row whose id is in `ids` in a single call.
    async fn delete_many(&self, ids: &[TaskId]) -> Result<(), RemoteError>;
}

/// Builds the store the config asks for: the hosted database when a URL is
/// set, otherwise an empty in-memory store.
#[tracing::instrument(skip(cfg))]
pub fn open_store(cfg: &StoreConfig) -> anyhow::Result<Rc<dyn TaskStore>> {
    if cfg.is_remote() {
        let store = RestTaskStore::new(cfg).context("failed to open hosted task store")?;
        info!(endpoint = %store.endpoint(), "using hosted task store");
        Ok(Rc::new(store))
    } else {
        info!("using in-memory task store");
        Ok(Rc::new(MemoryTaskStore::new()))
    }
}
