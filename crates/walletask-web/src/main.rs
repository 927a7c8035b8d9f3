use std::rc::Rc;

mod app;
mod components;
mod wallet;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  let config = app::load_config();
  tracing::info!(
    network = config.wallet.network.name(),
    hosted_store = config.store.is_remote(),
    table = %config.store.table,
    "starting walletask frontend"
  );

  let mount = web_sys::window()
    .and_then(|window| {
      window.document()
    })
    .and_then(|document| {
      document.get_element_by_id("app")
    })
    .expect(
      "missing #app mount element"
    );

  yew::Renderer::<app::App>::with_root_and_props(
    mount,
    app::AppProps {
      config: Rc::new(config)
    }
  )
  .render();
}
