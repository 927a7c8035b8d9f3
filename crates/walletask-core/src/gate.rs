use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info};

use crate::manager::{Observer, TaskManager};
use crate::store::TaskStore;

/// Read-only projection of the wallet connection.
pub trait WalletSignal {
    fn is_connected(&self) -> bool;
}

impl WalletSignal for Cell<bool> {
    fn is_connected(&self) -> bool {
        self.get()
    }
}

/// What the gate currently shows.
#[derive(Debug)]
pub enum GateView<'a> {
    ConnectPrompt(&'a str),
    Tasks(&'a TaskManager),
}

/// Result of [`SessionGate::sync`].
#[derive(Debug, PartialEq)]
pub enum GateTransition {
    Unchanged,
    /// A fresh manager was mounted; the caller should start its `load`.
    Mounted(TaskManager),
    Unmounted,
}

/// Shows the task manager only while a wallet is connected.
///
/// Every reconnect mounts a new, empty manager.
pub struct SessionGate {
    wallet: Rc<dyn WalletSignal>,
    store: Rc<dyn TaskStore>,
    prompt: String,
    observer: Option<Observer>,
    mounted: Option<TaskManager>,
}

impl SessionGate {
    pub fn new(
        wallet: Rc<dyn WalletSignal>,
        store: Rc<dyn TaskStore>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            wallet,
            store,
            prompt: prompt.into(),
            observer: None,
            mounted: None,
        }
    }

    /// Observer handed to every manager this gate mounts.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Reconciles the mounted manager with the wallet signal.
    #[tracing::instrument(skip(self))]
    pub fn sync(&mut self) -> GateTransition {
        let connected = self.wallet.is_connected();
        match (connected, self.mounted.is_some()) {
            (true, false) => {
                let mut manager = TaskManager::new(Rc::clone(&self.store));
                if let Some(observer) = &self.observer {
                    manager = manager.with_observer(Rc::clone(observer));
                }
                info!("wallet connected; mounting task manager");
                self.mounted = Some(manager.clone());
                GateTransition::Mounted(manager)
            }
            (false, true) => {
                if let Some(manager) = self.mounted.take() {
                    manager.unmount();
                }
                info!("wallet disconnected; task manager unmounted");
                GateTransition::Unmounted
            }
            _ => {
                debug!(connected, "gate unchanged");
                GateTransition::Unchanged
            }
        }
    }

    pub fn view(&self) -> GateView<'_> {
        match &self.mounted {
            Some(manager) => GateView::Tasks(manager),
            None => GateView::ConnectPrompt(&self.prompt),
        }
    }

    pub fn manager(&self) -> Option<&TaskManager> {
        self.mounted.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTaskStore;

    fn gate(wallet: &Rc<Cell<bool>>) -> SessionGate {
        SessionGate::new(
            Rc::clone(wallet) as Rc<dyn WalletSignal>,
            Rc::new(MemoryTaskStore::new()),
            "connect first",
        )
    }

    #[test]
    fn disconnected_gate_shows_prompt() {
        let wallet = Rc::new(Cell::new(false));
        let mut gate = gate(&wallet);
        assert_eq!(gate.sync(), GateTransition::Unchanged);
        assert!(matches!(gate.view(), GateView::ConnectPrompt("connect first")));
        assert!(gate.manager().is_none());
    }

    #[test]
    fn connect_mounts_and_disconnect_unmounts() {
        let wallet = Rc::new(Cell::new(false));
        let mut gate = gate(&wallet);

        wallet.set(true);
        let GateTransition::Mounted(manager) = gate.sync() else {
            panic!("expected a mount");
        };
        assert!(manager.is_live());
        assert!(matches!(gate.view(), GateView::Tasks(shown) if *shown == manager));
        assert_eq!(gate.sync(), GateTransition::Unchanged);

        wallet.set(false);
        assert_eq!(gate.sync(), GateTransition::Unmounted);
        assert!(!manager.is_live());
        assert!(matches!(gate.view(), GateView::ConnectPrompt(_)));
    }

    #[test]
    fn reconnect_mounts_a_fresh_manager() {
        let wallet = Rc::new(Cell::new(true));
        let mut gate = gate(&wallet);
        let GateTransition::Mounted(first) = gate.sync() else {
            panic!("expected a mount");
        };

        wallet.set(false);
        gate.sync();
        wallet.set(true);
        let GateTransition::Mounted(second) = gate.sync() else {
            panic!("expected a mount");
        };
        assert_ne!(first, second);
        assert!(second.is_live());
        assert!(!first.is_live());
    }
}
