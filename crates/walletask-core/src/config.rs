use anyhow::{
  Context,
  anyhow,
  bail
};
use reqwest::Url;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

const DEFAULT_TABLE: &str = "tasks";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TITLE: &str = "Tasks";
const DEFAULT_CONNECT_PROMPT: &str =
  "Connect your wallet to access the \
   Productivity App";

#[derive(
  Debug, Clone, Default, Deserialize,
  PartialEq,
)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
  pub store:  StoreConfig,
  pub wallet: WalletConfig,
  pub ui:     UiConfig
}

#[derive(
  Debug, Clone, Deserialize, PartialEq,
)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
  /// Base URL of the hosted database.
  /// Empty selects the in-memory
  /// preview store.
  pub url:          String,
  pub anon_key:     String,
  pub table:        String,
  pub timeout_secs: u64
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      url:          String::new(),
      anon_key:     String::new(),
      table:        DEFAULT_TABLE
        .to_string(),
      timeout_secs:
        DEFAULT_TIMEOUT_SECS
    }
  }
}

impl StoreConfig {
  pub fn is_remote(&self) -> bool {
    !self.url.trim().is_empty()
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
  #[default]
  Devnet,
  Testnet,
  MainnetBeta
}

impl Network {
  pub fn name(self) -> &'static str {
    match self {
      | Network::Devnet => "devnet",
      | Network::Testnet => "testnet",
      | Network::MainnetBeta => {
        "mainnet-beta"
      }
    }
  }

  /// Public RPC endpoint of the
  /// cluster.
  pub fn rpc_endpoint(
    self
  ) -> &'static str {
    match self {
      | Network::Devnet => {
        "https://api.devnet.solana.com"
      }
      | Network::Testnet => {
        "https://api.testnet.solana.com"
      }
      | Network::MainnetBeta => {
        "https://api.mainnet-beta.solana.com"
      }
    }
  }
}

#[derive(
  Debug, Clone, Deserialize, PartialEq,
)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
  pub network:      Network,
  pub auto_connect: bool
}

impl Default for WalletConfig {
  fn default() -> Self {
    Self {
      network:      Network::Devnet,
      auto_connect: true
    }
  }
}

#[derive(
  Debug, Clone, Deserialize, PartialEq,
)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
  pub title:          String,
  pub connect_prompt: String
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      title:          DEFAULT_TITLE
        .to_string(),
      connect_prompt:
        DEFAULT_CONNECT_PROMPT
          .to_string()
    }
  }
}

impl AppConfig {
  #[tracing::instrument(skip(raw))]
  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let cfg: AppConfig =
      toml::from_str(raw).context(
        "failed to parse app config"
      )?;
    cfg.validate()?;

    if cfg.store.is_remote() {
      info!(
        url = %cfg.store.url,
        table = %cfg.store.table,
        network = cfg.wallet.network.name(),
        "loaded app config"
      );
    } else {
      warn!(
        network = cfg.wallet.network.name(),
        "no store url configured; \
         tasks stay in memory"
      );
    }

    Ok(cfg)
  }

  fn validate(
    &self
  ) -> anyhow::Result<()> {
    if self.store.table.trim().is_empty()
    {
      bail!("store.table must not be empty");
    }

    if self.store.is_remote() {
      let url = Url::parse(
        self.store.url.trim()
      )
      .with_context(|| {
        format!(
          "store.url is not a valid \
           URL: {}",
          self.store.url
        )
      })?;

      if !matches!(
        url.scheme(),
        "http" | "https"
      ) {
        return Err(anyhow!(
          "store.url must use http or \
           https, got {}",
          url.scheme()
        ));
      }

      if self
        .store
        .anon_key
        .trim()
        .is_empty()
      {
        bail!(
          "store.anon_key is required \
           when store.url is set"
        );
      }
    }

    debug!(
      auto_connect = self.wallet.auto_connect,
      "validated app config"
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn empty_document_uses_defaults() {
    let cfg = AppConfig::from_toml_str("")
      .expect("defaults are valid");
    assert_eq!(cfg, AppConfig::default());
    assert!(!cfg.store.is_remote());
    assert_eq!(cfg.store.table, "tasks");
    assert_eq!(
      cfg.ui.connect_prompt,
      "Connect your wallet to access \
       the Productivity App"
    );
    assert!(cfg.wallet.auto_connect);
  }

  #[test]
  fn full_document_parses() {
    let raw = r#"
[store]
url = "https://example.supabase.co"
anon_key = "public-anon-key"
table = "todo_rows"
timeout_secs = 5

[wallet]
network = "mainnet-beta"
auto_connect = false

[ui]
title = "Chores"
connect_prompt = "Plug in a wallet"
"#;

    let cfg = AppConfig::from_toml_str(raw)
      .expect("valid config");
    assert!(cfg.store.is_remote());
    assert_eq!(cfg.store.table, "todo_rows");
    assert_eq!(cfg.store.timeout_secs, 5);
    assert_eq!(
      cfg.wallet.network,
      Network::MainnetBeta
    );
    assert_eq!(
      cfg.wallet.network.rpc_endpoint(),
      "https://api.mainnet-beta.solana.com"
    );
    assert!(!cfg.wallet.auto_connect);
    assert_eq!(cfg.ui.title, "Chores");
  }

  #[test]
  fn remote_url_requires_key() {
    let raw = r#"
[store]
url = "https://example.supabase.co"
"#;
    let err = AppConfig::from_toml_str(raw)
      .expect_err("missing key");
    assert!(
      err
        .to_string()
        .contains("anon_key")
    );
  }

  #[test]
  fn rejects_non_http_url() {
    let raw = r#"
[store]
url = "ftp://example.com"
anon_key = "k"
"#;
    assert!(
      AppConfig::from_toml_str(raw)
        .is_err()
    );
  }

  #[test]
  fn rejects_unknown_network() {
    let raw = r#"
[wallet]
network = "localnet"
"#;
    assert!(
      AppConfig::from_toml_str(raw)
        .is_err()
    );
  }

  #[test]
  fn rejects_blank_table() {
    let raw = r#"
[store]
table = " "
"#;
    assert!(
      AppConfig::from_toml_str(raw)
        .is_err()
    );
  }
}
