mod support;

use std::cell::Cell;
use std::rc::Rc;

use walletask_core::memory::MemoryTaskStore;
use walletask_core::{GateTransition, GateView, SessionGate, SyncError, WalletSignal};

const PROMPT: &str = "Connect your wallet to access the Productivity App";

fn gate_over(store: &Rc<MemoryTaskStore>, wallet: &Rc<Cell<bool>>) -> SessionGate {
    support::init_tracing();
    SessionGate::new(
        Rc::clone(wallet) as Rc<dyn WalletSignal>,
        store.clone(),
        PROMPT,
    )
}

#[tokio::test]
async fn connecting_mounts_a_manager_that_loads_the_store() {
    let store = Rc::new(MemoryTaskStore::with_rows(support::seed_rows()));
    let wallet = Rc::new(Cell::new(false));
    let mut gate = gate_over(&store, &wallet);

    assert!(matches!(gate.view(), GateView::ConnectPrompt(PROMPT)));

    wallet.set(true);
    let GateTransition::Mounted(manager) = gate.sync() else {
        panic!("connect should mount the task manager");
    };
    manager.load().await.expect("load");

    match gate.view() {
        GateView::Tasks(shown) => assert_eq!(shown.tasks().len(), 5),
        GateView::ConnectPrompt(_) => panic!("tasks should be visible"),
    }
}

#[tokio::test]
async fn every_mount_reloads_from_the_store() {
    let store = Rc::new(MemoryTaskStore::with_rows(support::seed_rows()));
    let wallet = Rc::new(Cell::new(true));
    let mut gate = gate_over(&store, &wallet);

    let GateTransition::Mounted(first) = gate.sync() else {
        panic!("expected mount");
    };
    first.load().await.expect("load");
    first.remove(5).await.expect("remove");

    wallet.set(false);
    assert_eq!(gate.sync(), GateTransition::Unmounted);
    wallet.set(true);
    let GateTransition::Mounted(second) = gate.sync() else {
        panic!("expected mount");
    };
    assert!(second.tasks().is_empty());

    second.load().await.expect("load");
    assert_eq!(second.tasks().len(), 4);
    assert_eq!(store.calls(), 3);
}

#[tokio::test]
async fn disconnect_during_load_discards_the_response() {
    let store = Rc::new(MemoryTaskStore::with_rows(support::seed_rows()));
    let wallet = Rc::new(Cell::new(true));
    let mut gate = gate_over(&store, &wallet);

    let GateTransition::Mounted(manager) = gate.sync() else {
        panic!("expected mount");
    };
    store.hold_responses();

    let (result, ()) = tokio::join!(manager.load(), async {
        support::wait_for_held(&store, 1).await;
        wallet.set(false);
        assert_eq!(gate.sync(), GateTransition::Unmounted);
        store.release_all();
    });

    assert!(matches!(result, Err(SyncError::Unmounted)));
    assert!(manager.tasks().is_empty());
    assert!(matches!(gate.view(), GateView::ConnectPrompt(_)));
}

#[tokio::test]
async fn wallet_flapping_without_change_keeps_the_same_manager() {
    let store = Rc::new(MemoryTaskStore::new());
    let wallet = Rc::new(Cell::new(true));
    let mut gate = gate_over(&store, &wallet);

    let GateTransition::Mounted(manager) = gate.sync() else {
        panic!("expected mount");
    };
    assert_eq!(gate.sync(), GateTransition::Unchanged);
    assert_eq!(gate.manager(), Some(&manager));
    assert_eq!(store.calls(), 0);
}
