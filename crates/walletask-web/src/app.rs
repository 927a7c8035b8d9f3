use std::cell::RefCell;
use std::rc::Rc;

use walletask_core::config::AppConfig;
use walletask_core::manager::Observer;
use walletask_core::memory::MemoryTaskStore;
use walletask_core::store::open_store;
use walletask_core::{
  GateTransition,
  GateView,
  SessionGate,
  TaskStore,
  WalletSignal
};
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html,
  use_effect_with,
  use_force_update,
  use_memo,
  use_state
};

use crate::components::{
  TaskManagerView,
  WalletButton
};
use crate::wallet::PhantomWallet;

const CONFIG_TOML: &str =
  include_str!("../config.toml");

pub fn load_config() -> AppConfig {
  AppConfig::from_toml_str(CONFIG_TOML)
    .unwrap_or_else(|err| {
      tracing::error!(
        error = %format!("{err:#}"),
        "invalid config.toml; using \
         defaults"
      );
      AppConfig::default()
    })
}

fn open_task_store(
  config: &AppConfig
) -> Rc<dyn TaskStore> {
  open_store(&config.store)
    .unwrap_or_else(|err| {
      tracing::error!(
        error = %format!("{err:#}"),
        "failed to open task store; \
         keeping tasks in memory"
      );
      Rc::new(MemoryTaskStore::new())
    })
}

#[derive(Properties, PartialEq)]
pub struct AppProps {
  pub config: Rc<AppConfig>
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
  let config = props.config.clone();
  let wallet = use_memo((), |_| {
    PhantomWallet::detect()
  });
  let connected = {
    let wallet = wallet.clone();
    use_state(move || {
      wallet.is_connected()
    })
  };
  let force_update = use_force_update();

  let gate = {
    let config = config.clone();
    let wallet = wallet.clone();
    let force_update =
      force_update.clone();
    use_memo((), move |_| {
      let observer: Observer =
        Rc::new(move || {
          force_update.force_update()
        });
      let signal: Rc<dyn WalletSignal> =
        wallet.signal();
      tracing::info!(
        network = config.wallet.network.name(),
        rpc = config.wallet.network.rpc_endpoint(),
        "session gate ready"
      );
      RefCell::new(
        SessionGate::new(
          signal,
          open_task_store(&config),
          config
            .ui
            .connect_prompt
            .clone()
        )
        .with_observer(observer)
      )
    })
  };

  {
    let wallet = wallet.clone();
    let setter = connected.setter();
    let auto_connect =
      config.wallet.auto_connect;
    use_effect_with((), move |_| {
      let on_event = setter.clone();
      wallet.subscribe(Rc::new(
        move |value| on_event.set(value)
      ));

      if auto_connect
        && wallet.is_installed()
      {
        let wallet = (*wallet).clone();
        wasm_bindgen_futures::spawn_local(
          async move {
            match wallet.connect(true).await {
              | Ok(()) => {
                tracing::info!(
                  "auto-connected trusted \
                   wallet"
                );
                setter.set(true);
              }
              | Err(err) => tracing::debug!(error = %err, "auto-connect skipped")
            }
          }
        );
      }

      || ()
    });
  }

  {
    let gate = gate.clone();
    let force_update =
      force_update.clone();
    use_effect_with(
      *connected,
      move |connected| {
        tracing::debug!(
          connected = *connected,
          "wallet signal changed"
        );
        let transition =
          gate.borrow_mut().sync();
        match transition {
          | GateTransition::Mounted(
            manager
          ) => {
            force_update.force_update();
            wasm_bindgen_futures::spawn_local(
              async move {
                if let Err(err) =
                  manager.load().await
                {
                  tracing::debug!(error = %err, "initial load had no effect");
                }
              }
            );
          }
          | GateTransition::Unmounted => {
            force_update.force_update()
          }
          | GateTransition::Unchanged => {}
        }
        || ()
      }
    );
  }

  let on_wallet_change = {
    let setter = connected.setter();
    Callback::from(move |value: bool| {
      setter.set(value)
    })
  };

  let body = match gate.borrow().view() {
    | GateView::ConnectPrompt(prompt) => {
      html! {
          <p class="prompt">{ prompt.to_string() }</p>
      }
    }
    | GateView::Tasks(manager) => {
      html! {
          <TaskManagerView
              manager={manager.clone()}
              revision={manager.revision()}
          />
      }
    }
  };

  html! {
      <div class="shell">
          <h1>{ config.ui.title.clone() }</h1>
          <WalletButton
              wallet={(*wallet).clone()}
              connected={*connected}
              network={config.wallet.network.name().to_string()}
              on_change={on_wallet_change}
          />
          { body }
      </div>
  }
}
