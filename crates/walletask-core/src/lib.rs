pub mod config;
pub mod error;
pub mod gate;
pub mod manager;
pub mod memory;
pub mod rest;
pub mod schedule;
pub mod store;

pub use config::AppConfig;
pub use error::{
  RemoteError,
  SyncError
};
pub use gate::{
  GateTransition,
  GateView,
  SessionGate,
  WalletSignal
};
pub use manager::{
  Draft,
  TaskManager
};
pub use store::TaskStore;
pub use walletask_shared::{
  NewTask,
  Task,
  TaskId,
  TaskState
};
