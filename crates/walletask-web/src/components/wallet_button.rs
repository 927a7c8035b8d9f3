use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html
};

use crate::wallet::PhantomWallet;

const INSTALL_URL: &str =
  "https://phantom.app/";

#[derive(Properties, PartialEq)]
pub struct WalletButtonProps {
  pub wallet:    PhantomWallet,
  pub connected: bool,
  pub network:   String,
  pub on_change: Callback<bool>
}

#[function_component(WalletButton)]
pub fn wallet_button(
  props: &WalletButtonProps
) -> Html {
  if !props.wallet.is_installed() {
    return html! {
        <div class="wallet">
            <a class="btn" href={INSTALL_URL} target="_blank" rel="noopener noreferrer">
                { "Install Phantom" }
            </a>
        </div>
    };
  }

  let onclick = {
    let wallet = props.wallet.clone();
    let connected = props.connected;
    let on_change =
      props.on_change.clone();
    Callback::from(
      move |_: MouseEvent| {
        let wallet = wallet.clone();
        let on_change =
          on_change.clone();
        wasm_bindgen_futures::spawn_local(
          async move {
            let result = if connected {
              wallet.disconnect().await
            } else {
              wallet.connect(false).await
            };
            match result {
              | Ok(()) => {
                on_change.emit(!connected)
              }
              | Err(err) => tracing::warn!(error = %err, "wallet request failed")
            }
          }
        );
      }
    )
  };

  let label = if props.connected {
    props
      .wallet
      .public_key()
      .map(|key| shorten_key(&key))
      .unwrap_or_else(|| {
        "Disconnect".to_string()
      })
  } else {
    "Connect Phantom".to_string()
  };
  let title = if props.connected {
    "Disconnect wallet"
  } else {
    "Connect wallet"
  };

  html! {
      <div class="wallet">
          <button class="btn" {onclick} title={title}>{ label }</button>
          <span class="badge">{ props.network.clone() }</span>
      </div>
  }
}

/// `AbCd..WxYz` form of a base58 key.
fn shorten_key(key: &str) -> String {
  let chars: Vec<char> =
    key.chars().collect();
  if chars.len() <= 8 {
    return key.to_string();
  }
  let head: String =
    chars[..4].iter().collect();
  let tail: String = chars
    [chars.len() - 4..]
    .iter()
    .collect();
  format!("{head}..{tail}")
}

#[cfg(test)]
mod tests {
  use super::shorten_key;

  #[test]
  fn long_keys_are_shortened() {
    assert_eq!(
      shorten_key(
        "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
      ),
      "9xQe..VFin"
    );
  }

  #[test]
  fn short_keys_are_kept() {
    assert_eq!(
      shorten_key("abc"),
      "abc"
    );
  }
}
