use std::cell::Cell;
use std::rc::Rc;

use js_sys::{
  Function,
  Promise,
  Reflect
};
use serde::Serialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{
  JsCast,
  JsValue
};
use wasm_bindgen_futures::JsFuture;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectOptions {
  only_if_trusted: bool
}

/// Phantom's injected Solana provider.
///
/// The connection flag lives in a
/// shared cell so the session gate can
/// read it as its wallet signal.
#[derive(Clone)]
pub struct PhantomWallet {
  provider:  Option<JsValue>,
  connected: Rc<Cell<bool>>
}

impl PartialEq for PhantomWallet {
  fn eq(
    &self,
    other: &Self
  ) -> bool {
    Rc::ptr_eq(
      &self.connected,
      &other.connected
    )
  }
}

impl PhantomWallet {
  pub fn detect() -> Self {
    let window: JsValue =
      gloo::utils::window().into();
    let provider =
      lookup(&window, &[
        "phantom", "solana"
      ])
      .or_else(|| {
        lookup(&window, &["solana"])
      })
      .filter(|provider| {
        flag(provider, "isPhantom")
      });

    let connected = provider
      .as_ref()
      .is_some_and(|provider| {
        flag(provider, "isConnected")
      });

    if provider.is_some() {
      tracing::info!(
        connected,
        "found phantom provider"
      );
    } else {
      tracing::warn!(
        "phantom provider not found"
      );
    }

    Self {
      provider,
      connected: Rc::new(Cell::new(
        connected
      ))
    }
  }

  pub fn is_installed(&self) -> bool {
    self.provider.is_some()
  }

  pub fn is_connected(&self) -> bool {
    self.connected.get()
  }

  pub fn signal(
    &self
  ) -> Rc<Cell<bool>> {
    Rc::clone(&self.connected)
  }

  /// Base58 public key of the
  /// connected account.
  pub fn public_key(
    &self
  ) -> Option<String> {
    let provider =
      self.provider.as_ref()?;
    let key = Reflect::get(
      provider,
      &JsValue::from_str("publicKey")
    )
    .ok()?;
    if key.is_null()
      || key.is_undefined()
    {
      return None;
    }
    call_method(&key, "toString", &[])
      .ok()?
      .as_string()
  }

  /// Asks Phantom for the account.
  /// With `only_if_trusted` the user
  /// is not prompted; untrusted sites
  /// get a rejection instead.
  pub async fn connect(
    &self,
    only_if_trusted: bool
  ) -> Result<(), String> {
    let provider = self
      .provider
      .as_ref()
      .ok_or_else(|| {
        "phantom is not installed"
          .to_string()
      })?;

    let options =
      serde_wasm_bindgen::to_value(
        &ConnectOptions {
          only_if_trusted
        }
      )
      .map_err(|e| {
        format!(
          "failed to encode connect \
           options: {e}"
        )
      })?;

    let pending = call_method(
      provider,
      "connect",
      &[options]
    )?;
    await_promise(pending).await?;
    self.connected.set(true);
    Ok(())
  }

  pub async fn disconnect(
    &self
  ) -> Result<(), String> {
    let Some(provider) =
      self.provider.as_ref()
    else {
      return Ok(());
    };
    let pending = call_method(
      provider,
      "disconnect",
      &[]
    )?;
    await_promise(pending).await?;
    self.connected.set(false);
    Ok(())
  }

  /// Keeps the shared flag in step
  /// with provider events and reports
  /// every change to `on_change`.
  pub fn subscribe(
    &self,
    on_change: Rc<dyn Fn(bool)>
  ) {
    let Some(provider) =
      self.provider.as_ref()
    else {
      return;
    };

    for (event, value) in
      [("connect", true), (
        "disconnect",
        false
      )]
    {
      let connected =
        Rc::clone(&self.connected);
      let on_change =
        Rc::clone(&on_change);
      let listener =
        Closure::<dyn Fn()>::new(
          move || {
            tracing::info!(
              event,
              "wallet event"
            );
            connected.set(value);
            on_change(value);
          }
        );

      let callback: &JsValue =
        listener.as_ref();
      if let Err(err) = call_method(
        provider,
        "on",
        &[
          JsValue::from_str(event),
          callback.clone()
        ]
      ) {
        tracing::error!(error = %err, event, "failed to subscribe to wallet event");
      }
      // The provider outlives the page.
      listener.forget();
    }
  }
}

fn lookup(
  root: &JsValue,
  path: &[&str]
) -> Option<JsValue> {
  path.iter().try_fold(
    root.clone(),
    |current, key| {
      let next = Reflect::get(
        &current,
        &JsValue::from_str(key)
      )
      .ok()?;
      (!next.is_undefined()
        && !next.is_null())
      .then_some(next)
    }
  )
}

fn flag(
  target: &JsValue,
  key: &str
) -> bool {
  Reflect::get(
    target,
    &JsValue::from_str(key)
  )
  .ok()
  .and_then(|value| value.as_bool())
  .unwrap_or(false)
}

fn call_method(
  target: &JsValue,
  name: &str,
  args: &[JsValue]
) -> Result<JsValue, String> {
  let method: Function = Reflect::get(
    target,
    &JsValue::from_str(name)
  )
  .map_err(|e| {
    format!("missing {name}: {e:?}")
  })?
  .dyn_into()
  .map_err(|_| {
    format!("{name} is not a function")
  })?;

  let js_args: js_sys::Array =
    args.iter().cloned().collect();
  method
    .apply(target, &js_args)
    .map_err(|e| {
      format!("{name} failed: {e:?}")
    })
}

async fn await_promise(
  value: JsValue
) -> Result<JsValue, String> {
  let promise: Promise =
    value.dyn_into().map_err(|_| {
      "provider did not return a \
       promise"
        .to_string()
    })?;
  JsFuture::from(promise)
    .await
    .map_err(|e| {
      format!("wallet rejected: {e:?}")
    })
}
