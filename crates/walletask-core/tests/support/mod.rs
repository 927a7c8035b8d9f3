#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use walletask_core::memory::MemoryTaskStore;
use walletask_core::{Task, TaskState};
use walletask_shared::row_time;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub fn task(id: i64, text: &str, scheduled: Option<&str>) -> Task {
    Task {
        id,
        text: text.to_string(),
        scheduled_time: scheduled.and_then(row_time::parse),
        state: TaskState::Ready,
        created_at: None,
    }
}

/// Five rows, seeded oldest first, so a load lists ids 5..=1.
pub fn seed_rows() -> Vec<Task> {
    vec![
        task(1, "file taxes", None),
        task(2, "book flights", Some("2024-03-01T10:00")),
        task(3, "call plumber", None),
        task(4, "renew passport", Some("2024-01-01T09:00")),
        task(5, "water plants", None),
    ]
}

/// Yields until `count` store calls are parked on held responses.
pub async fn wait_for_held(store: &MemoryTaskStore, count: usize) {
    while store.held_count() < count {
        tokio::task::yield_now().await;
    }
}
