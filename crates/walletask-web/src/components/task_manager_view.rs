use std::future::Future;

use walletask_core::{
  SyncError,
  TaskManager
};
use walletask_shared::{
  TaskId,
  TaskState
};
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

use super::{
  BulkActions,
  NewTaskForm,
  TaskRow
};

#[derive(Properties, PartialEq)]
pub struct TaskManagerViewProps {
  pub manager:  TaskManager,
  /// Bumped by the manager on every
  /// local change so equal handles
  /// still re-render.
  pub revision: u64
}

/// Runs a manager operation in the
/// background. Failures are already
/// logged by the manager.
fn run<F>(
  op: &'static str,
  fut: F
) where
  F: Future<Output = Result<(), SyncError>>
    + 'static
{
  wasm_bindgen_futures::spawn_local(
    async move {
      if let Err(err) = fut.await {
        tracing::debug!(op, error = %err, "task operation had no effect");
      }
    }
  );
}

#[function_component(TaskManagerView)]
pub fn task_manager_view(
  props: &TaskManagerViewProps
) -> Html {
  let manager = &props.manager;

  let on_text = {
    let manager = manager.clone();
    Callback::from(move |text: String| {
      manager.set_draft_text(text)
    })
  };
  let on_date = {
    let manager = manager.clone();
    Callback::from(move |date: String| {
      manager.set_draft_date(date)
    })
  };
  let on_time = {
    let manager = manager.clone();
    Callback::from(move |time: String| {
      manager.set_draft_time(time)
    })
  };
  let on_submit = {
    let manager = manager.clone();
    Callback::from(move |()| {
      let manager = manager.clone();
      run("add", async move {
        manager.add().await
      });
    })
  };
  let on_toggle_select = {
    let manager = manager.clone();
    Callback::from(move |id: TaskId| {
      manager.toggle_select(id)
    })
  };
  let on_state_change = {
    let manager = manager.clone();
    Callback::from(
      move |(id, state): (
        TaskId,
        TaskState
      )| {
        let manager = manager.clone();
        run("update_state", async move {
          manager
            .update_state(id, state)
            .await
        });
      }
    )
  };
  let on_remove = {
    let manager = manager.clone();
    Callback::from(move |id: TaskId| {
      let manager = manager.clone();
      run("remove", async move {
        manager.remove(id).await
      });
    })
  };
  let on_bulk_delete = {
    let manager = manager.clone();
    Callback::from(
      move |_: web_sys::MouseEvent| {
        let manager = manager.clone();
        run("bulk_delete", async move {
          manager.bulk_delete().await
        });
      }
    )
  };

  let tasks = manager.display_tasks();

  html! {
      <section class="task-manager">
          <NewTaskForm
              draft={manager.draft()}
              {on_text}
              {on_date}
              {on_time}
              {on_submit}
          />
          <BulkActions
              bulk_count={manager.selected_ids().len()}
              {on_bulk_delete}
          />
          {
              if tasks.is_empty() {
                  html! { <div class="empty">{ "No tasks yet." }</div> }
              } else {
                  html! {
                      <ul class="tasks">
                          {
                              for tasks.into_iter().map(|task| {
                                  let selected = manager.is_selected(task.id);
                                  html! {
                                      <TaskRow
                                          key={task.id.to_string()}
                                          {task}
                                          {selected}
                                          on_toggle_select={on_toggle_select.clone()}
                                          on_state_change={on_state_change.clone()}
                                          on_remove={on_remove.clone()}
                                      />
                                  }
                              })
                          }
                      </ul>
                  }
              }
          }
      </section>
  }
}
