mod bulk_actions;
mod new_task_form;
mod task_manager_view;
mod task_row;
mod wallet_button;

pub use bulk_actions::BulkActions;
pub use new_task_form::NewTaskForm;
pub use task_manager_view::TaskManagerView;
pub use task_row::TaskRow;
pub use wallet_button::WalletButton;
