use walletask_core::Draft;
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct NewTaskFormProps {
  pub draft:     Draft,
  pub on_text:   Callback<String>,
  pub on_date:   Callback<String>,
  pub on_time:   Callback<String>,
  pub on_submit: Callback<()>
}

fn input_value(
  callback: &Callback<String>
) -> Callback<web_sys::InputEvent> {
  let callback = callback.clone();
  Callback::from(
    move |e: web_sys::InputEvent| {
      let input: web_sys::HtmlInputElement =
        e.target_unchecked_into();
      callback.emit(input.value());
    }
  )
}

#[function_component(NewTaskForm)]
pub fn new_task_form(
  props: &NewTaskFormProps
) -> Html {
  let on_keydown = {
    let on_submit =
      props.on_submit.clone();
    Callback::from(
      move |e: web_sys::KeyboardEvent| {
        if e.key() == "Enter" {
          e.prevent_default();
          on_submit.emit(());
        }
      }
    )
  };
  let on_click = {
    let on_submit =
      props.on_submit.clone();
    Callback::from(
      move |_: web_sys::MouseEvent| {
        on_submit.emit(())
      }
    )
  };

  html! {
      <div class="new-task">
          <input
              class="text"
              type="text"
              placeholder="What needs doing?"
              value={props.draft.text.clone()}
              oninput={input_value(&props.on_text)}
              onkeydown={on_keydown}
          />
          <input
              class="date"
              type="date"
              value={props.draft.date.clone()}
              oninput={input_value(&props.on_date)}
          />
          <input
              class="time"
              type="time"
              value={props.draft.time.clone()}
              oninput={input_value(&props.on_time)}
          />
          <button class="btn primary" onclick={on_click}>{ "+ Add Task" }</button>
      </div>
  }
}
