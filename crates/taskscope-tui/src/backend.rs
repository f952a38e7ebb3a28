//! Background event loop talking to the gateway.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use taskscope_client::{
    ClientConfig, HttpClient, HttpEventSource, LoadError, MountToken, PushTransport,
    SnapshotLoader, TaskApi, TaskDetailBinder, TaskSnapshot,
};
use taskscope_core::{TaskId, TaskStatus};

use crate::event::{BackendCommand, UiEvent};

type LoadResult = (MountToken, Result<TaskSnapshot, LoadError>);

/// Run the backend loop.
///
/// Runs on its own thread inside a current-thread tokio runtime. While the
/// task list is shown it refreshes it periodically; while a task is open it
/// drives that task's [`TaskDetailBinder`] and publishes every new render
/// state to the UI thread.
pub async fn run_backend(
    config: ClientConfig,
    status_filter: Option<TaskStatus>,
    initial_task: Option<TaskId>,
    ui_tx: mpsc::Sender<UiEvent>,
    mut cmd_rx: mpsc::Receiver<BackendCommand>,
) {
    let http = match HttpClient::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            let _ = ui_tx.send(UiEvent::Fatal(e.to_string())).await;
            return;
        }
    };

    // Event streams stay open indefinitely, so this client has no timeout.
    let stream_client = match reqwest::Client::builder().build() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to build stream client");
            let _ = ui_tx.send(UiEvent::Fatal(e.to_string())).await;
            return;
        }
    };
    let transport: Arc<dyn PushTransport> =
        Arc::new(HttpEventSource::new(stream_client, config.reconnect_delay));

    let api: Arc<dyn TaskApi> = Arc::new(http.clone());
    let loader = SnapshotLoader::new(api.clone());
    let (load_tx, mut load_rx) = mpsc::unbounded_channel::<LoadResult>();

    let mut backend = Backend {
        config,
        api,
        loader,
        transport,
        load_tx,
        ui_tx,
        status_filter,
        detail: None,
    };

    check_health(&http, &backend.ui_tx).await;

    if let Some(task_id) = initial_task {
        backend.open_task(task_id).await;
    }

    let mut interval = tokio::time::interval(backend.config.list_refresh);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Periodic list refresh, only while the list is on screen
            _ = interval.tick(), if backend.detail.is_none() => {
                debug!("Refresh tick");
                backend.refresh_tasks().await;
            }

            // Commands from UI thread
            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    BackendCommand::Quit => {
                        info!("Received quit command, shutting down backend");
                        break;
                    }
                    BackendCommand::RefreshTasks => {
                        debug!("Manual refresh: tasks");
                        check_health(&http, &backend.ui_tx).await;
                        backend.refresh_tasks().await;
                    }
                    BackendCommand::SetStatusFilter(filter) => {
                        debug!(filter = ?filter, "Status filter changed");
                        backend.status_filter = filter;
                        backend.refresh_tasks().await;
                    }
                    BackendCommand::OpenTask(task_id) => {
                        backend.open_task(task_id).await;
                    }
                    BackendCommand::CloseTask => {
                        backend.close_task();
                        interval.reset_immediately();
                    }
                }
            }

            // Snapshot loads, tagged with the mount that issued them
            Some((token, result)) = load_rx.recv() => {
                backend.on_load(token, result).await;
            }

            // Push stream activity of the open task
            _ = stream_activity(&mut backend.detail) => {
                backend.publish_detail().await;
            }
        }
    }

    backend.close_task();
    info!("Backend shutdown complete");
}

/// Wait for the open task's stream. Never completes when no task is open.
async fn stream_activity(detail: &mut Option<TaskDetailBinder>) {
    match detail {
        Some(binder) => binder.next_stream_activity().await,
        None => std::future::pending().await,
    }
}

async fn check_health(http: &HttpClient, ui_tx: &mpsc::Sender<UiEvent>) {
    let healthy = match http.health().await {
        Ok(ok) => ok,
        Err(e) => {
            debug!(error = %e, "Health check failed");
            false
        }
    };
    let _ = ui_tx.send(UiEvent::Health(healthy)).await;
}

struct Backend {
    config: ClientConfig,
    api: Arc<dyn TaskApi>,
    loader: SnapshotLoader,
    transport: Arc<dyn PushTransport>,
    load_tx: mpsc::UnboundedSender<LoadResult>,
    ui_tx: mpsc::Sender<UiEvent>,
    status_filter: Option<TaskStatus>,
    detail: Option<TaskDetailBinder>,
}

impl Backend {
    async fn refresh_tasks(&self) {
        match self.api.list_tasks(self.status_filter).await {
            Ok(tasks) => {
                debug!(count = tasks.len(), "Fetched tasks");
                let _ = self.ui_tx.send(UiEvent::TasksUpdated(tasks)).await;
            }
            Err(e) => {
                debug!(error = %e, "Failed to fetch tasks");
                let _ = self.ui_tx.send(UiEvent::TaskListError(e.to_string())).await;
            }
        }
    }

    /// Mount a binder for `task_id` and issue its single snapshot load.
    ///
    /// The previous binder, if any, is disposed first so its subscription is
    /// closed before the new load starts.
    async fn open_task(&mut self, task_id: TaskId) {
        self.close_task();

        info!(task_id = %task_id, "Opening task");
        let binder = TaskDetailBinder::mount(task_id, self.transport.clone(), &self.config.base_url);

        let loader = self.loader.clone();
        let load_tx = self.load_tx.clone();
        let token = binder.token();
        let task_id = binder.task_id().clone();
        tokio::spawn(async move {
            let result = loader.load(&task_id).await;
            let _ = load_tx.send((token, result));
        });

        self.detail = Some(binder);
        self.publish_detail().await;
    }

    fn close_task(&mut self) {
        if let Some(mut binder) = self.detail.take() {
            debug!(task_id = %binder.task_id(), "Closing task");
            binder.dispose();
        }
    }

    async fn on_load(&mut self, token: MountToken, result: Result<TaskSnapshot, LoadError>) {
        let applied = match self.detail.as_mut() {
            Some(binder) => binder.apply_snapshot(token, result),
            None => {
                debug!(token = ?token, "Dropping load result, no task open");
                false
            }
        };
        if applied {
            self.publish_detail().await;
        }
    }

    async fn publish_detail(&self) {
        if let Some(binder) = &self.detail {
            let _ = self.ui_tx.send(UiEvent::DetailUpdated(binder.snapshot())).await;
        }
    }
}
