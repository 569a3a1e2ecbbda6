//! Task writes. Each one refreshes the tasks widget after the store
//! confirms it.

use crate::core::{Id, Task};
use crate::store::{StoreError, TaskStore};
use crate::widget::{self, Widget, WidgetNotifier};

/// Insert `task` and return its new id.
pub async fn add_task<S: TaskStore, N: WidgetNotifier>(
    store: &S,
    notifier: &N,
    task: Task,
) -> Result<Id, StoreError> {
    let id = store.insert_task(task).await?;
    log::info!("Added task {}", id);
    widget::refresh(notifier, Widget::Tasks).await;
    Ok(id)
}

pub async fn update_task<S: TaskStore, N: WidgetNotifier>(
    store: &S,
    notifier: &N,
    task: Task,
) -> Result<(), StoreError> {
    let id = task.id;
    store.update_task(task).await?;
    log::info!("Updated task {:?}", id);
    widget::refresh(notifier, Widget::Tasks).await;
    Ok(())
}

/// Mark the task with `id` done and return it.
pub async fn complete_task<S: TaskStore, N: WidgetNotifier>(
    store: &S,
    notifier: &N,
    id: Id,
) -> Result<Task, StoreError> {
    let mut task = store
        .get_task(id)
        .await?
        .ok_or(StoreError::NotFound { entity: "task", id })?;
    task.complete();
    update_task(store, notifier, task.clone()).await?;
    Ok(task)
}

pub async fn delete_task<S: TaskStore, N: WidgetNotifier>(
    store: &S,
    notifier: &N,
    task: &Task,
) -> Result<(), StoreError> {
    store.delete_task(task).await?;
    log::info!("Deleted task {:?}", task.id);
    widget::refresh(notifier, Widget::Tasks).await;
    Ok(())
}
