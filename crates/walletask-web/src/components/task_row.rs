use walletask_core::schedule::format_for_display;
use walletask_shared::{
  Task,
  TaskId,
  TaskState
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct TaskRowProps {
  pub task:             Task,
  pub selected:         bool,
  pub on_toggle_select: Callback<TaskId>,
  pub on_state_change:
    Callback<(TaskId, TaskState)>,
  pub on_remove:        Callback<TaskId>
}

#[function_component(TaskRow)]
pub fn task_row(
  props: &TaskRowProps
) -> Html {
  let id = props.task.id;
  let on_toggle_select =
    props.on_toggle_select.clone();
  let on_remove =
    props.on_remove.clone();

  let on_state = {
    let on_state_change =
      props.on_state_change.clone();
    Callback::from(
      move |e: web_sys::Event| {
        let Some(select) = e
          .target_dyn_into::<
            web_sys::HtmlSelectElement
          >()
        else {
          tracing::warn!(
            "state change event had \
             non-select target"
          );
          return;
        };
        match select
          .value()
          .parse::<TaskState>()
        {
          | Ok(state) => {
            on_state_change
              .emit((id, state))
          }
          | Err(err) => tracing::warn!(error = %err, "ignoring state option")
        }
      }
    )
  };

  let class = if props.selected {
    "row selected"
  } else {
    "row"
  };
  let dot_class = match props.task.state
  {
    | TaskState::Ready => "dot ready",
    | TaskState::InProgress => {
      "dot progress"
    }
    | TaskState::InReview => {
      "dot review"
    }
    | TaskState::Completed => {
      "dot done"
    }
  };

  html! {
      <li class={class}>
          <button
              class={if props.selected { "selector on" } else { "selector" }}
              onclick={move |_: web_sys::MouseEvent| on_toggle_select.emit(id)}
          >
              { if props.selected { "✓" } else { "" } }
          </button>
          <div class={dot_class}></div>
          <div class="task-text">{ &props.task.text }</div>
          {
              match props.task.scheduled_time {
                  Some(when) => html! {
                      <span class="badge">{ format_for_display(&when) }</span>
                  },
                  None => html! {}
              }
          }
          <select class="state" onchange={on_state}>
              {
                  for TaskState::ALL.iter().map(|state| html! {
                      <option
                          value={state.label()}
                          selected={*state == props.task.state}
                      >
                          { state.label() }
                      </option>
                  })
              }
          </select>
          <button
              class="btn danger"
              title="Delete task"
              onclick={move |_: web_sys::MouseEvent| on_remove.emit(id)}
          >
              { "Delete" }
          </button>
      </li>
  }
}
