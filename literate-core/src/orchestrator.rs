//! The update orchestrator.
//!
//! A single task owns the [`ObjectManager`] and is the only thing that ever
//! mutates the collection. Callers talk to it through an
//! [`OrchestratorHandle`] and watch what it does through a stream of
//! [`OrchestratorEvent`]s.
//!
//! Text changes are debounced: each new text cancels the pending wait and
//! starts a fresh one, so only the last edit in a burst is extracted. At most
//! one model call (extraction or correction) runs at a time. A debounce that
//! elapses while a call is running is deferred and runs as soon as the call
//! finishes.
//!
//! Events go out on an unbounded channel so the task never waits on a slow
//! consumer; front-ends are expected to drain it every tick.

use crate::manager::{ObjectManager, UpdateError, UpdateResult};
use crate::model::NarrativeModel;
use crate::narrative::{CollectionStatistics, NarrativeObject};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Quiet period after the last text change before extraction runs.
    pub debounce: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(3000),
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Something the orchestrator did.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// A new debounce wait started.
    DebounceScheduled { delay: Duration },
    /// A pending debounce wait was abandoned before it elapsed.
    DebounceCancelled,
    /// An extraction call was sent to the model.
    ExtractionStarted { chars: usize },
    /// A debounce elapsed while another call was running; it will run next.
    ExtractionDeferred,
    ExtractionFinished(UpdateResult),
    CorrectionStarted { name: String },
    CorrectionFinished { name: String, result: UpdateResult },
    Cleared,
    Removed { name: String, removed: bool },
}

/// Errors from talking to the orchestrator task.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("The orchestrator has shut down")]
    Closed,
}

enum Command {
    TextChanged(String),
    Retry(String),
    Clear,
    Remove(String),
    Snapshot(oneshot::Sender<Vec<NarrativeObject>>),
    Statistics(oneshot::Sender<CollectionStatistics>),
    Shutdown,
}

/// Messages from tasks the orchestrator spawned.
enum TaskMessage {
    DebounceElapsed {
        generation: u64,
    },
    ExtractionDone(Result<String, UpdateError>),
    CorrectionDone {
        name: String,
        result: Result<String, UpdateError>,
    },
}

/// Cheap, cloneable handle to the orchestrator task.
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<Command>,
}

impl OrchestratorHandle {
    /// Report the full current text.
    pub async fn text_changed(&self, text: impl Into<String>) -> Result<(), OrchestratorError> {
        self.send(Command::TextChanged(text.into())).await
    }

    /// Ask the model for a corrected version of one object.
    pub async fn retry(&self, name: impl Into<String>) -> Result<(), OrchestratorError> {
        self.send(Command::Retry(name.into())).await
    }

    pub async fn clear(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Clear).await
    }

    pub async fn remove(&self, name: impl Into<String>) -> Result<(), OrchestratorError> {
        self.send(Command::Remove(name.into())).await
    }

    /// Every object, most recently updated first.
    pub async fn snapshot(&self) -> Result<Vec<NarrativeObject>, OrchestratorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| OrchestratorError::Closed)
    }

    pub async fn statistics(&self) -> Result<CollectionStatistics, OrchestratorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Statistics(tx)).await?;
        rx.await.map_err(|_| OrchestratorError::Closed)
    }

    /// Stop the task. Pending waits and in-flight calls are abandoned.
    pub async fn shutdown(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), OrchestratorError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| OrchestratorError::Closed)
    }
}

/// Spawn the orchestrator task on the current tokio runtime.
pub fn spawn_orchestrator(
    model: Arc<dyn NarrativeModel>,
    manager: ObjectManager,
    config: OrchestratorConfig,
) -> (OrchestratorHandle, mpsc::UnboundedReceiver<OrchestratorEvent>) {
    let (command_tx, command_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (task_tx, task_rx) = mpsc::channel(8);

    let orchestrator = Orchestrator {
        model,
        manager,
        config,
        events: event_tx,
        tasks: task_tx,
        last_text: String::new(),
        generation: 0,
        pending: None,
        in_flight: None,
        deferred: None,
    };
    tokio::spawn(orchestrator.run(command_rx, task_rx));

    (OrchestratorHandle { commands: command_tx }, event_rx)
}

struct PendingDebounce {
    generation: u64,
    token: CancellationToken,
}

struct Orchestrator {
    model: Arc<dyn NarrativeModel>,
    manager: ObjectManager,
    config: OrchestratorConfig,
    events: mpsc::UnboundedSender<OrchestratorEvent>,
    tasks: mpsc::Sender<TaskMessage>,
    last_text: String,
    /// Bumped for every scheduled debounce; stale elapses are ignored.
    generation: u64,
    pending: Option<PendingDebounce>,
    /// The running model call, if any. Its presence is the single-flight guard.
    in_flight: Option<AbortHandle>,
    /// Text whose debounce elapsed while a call was running.
    deferred: Option<String>,
}

impl Orchestrator {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut tasks: mpsc::Receiver<TaskMessage>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(message) = tasks.recv() => self.handle_task(message).await,
            }
        }

        self.cancel_pending();
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        tracing::debug!("orchestrator stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::TextChanged(text) => self.text_changed(text).await,
            Command::Retry(name) => self.retry(name).await,
            Command::Clear => {
                self.manager.clear().await;
                self.emit(OrchestratorEvent::Cleared).await;
            }
            Command::Remove(name) => {
                let removed = self.manager.remove_object(&name).await;
                self.emit(OrchestratorEvent::Removed { name, removed }).await;
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.manager.all_objects());
            }
            Command::Statistics(reply) => {
                let _ = reply.send(self.manager.statistics());
            }
            Command::Shutdown => {}
        }
    }

    async fn handle_task(&mut self, message: TaskMessage) {
        match message {
            TaskMessage::DebounceElapsed { generation } => self.debounce_elapsed(generation).await,
            TaskMessage::ExtractionDone(response) => {
                self.in_flight = None;
                let result = match response {
                    Ok(raw) => self.manager.process_response(&raw).await,
                    Err(e) => {
                        tracing::warn!(error = %e, "extraction failed");
                        self.manager.failure(e)
                    }
                };
                self.emit(OrchestratorEvent::ExtractionFinished(result)).await;
                self.run_deferred().await;
            }
            TaskMessage::CorrectionDone { name, result } => {
                self.in_flight = None;
                let result = match result {
                    Ok(raw) => self.manager.apply_correction(&name, &raw).await,
                    Err(e) => {
                        tracing::warn!(object = %name, error = %e, "correction failed");
                        self.manager.failure(e)
                    }
                };
                self.emit(OrchestratorEvent::CorrectionFinished { name, result }).await;
                self.run_deferred().await;
            }
        }
    }

    async fn text_changed(&mut self, text: String) {
        if text == self.last_text {
            return;
        }
        self.last_text = text;
        self.deferred = None;

        if self.cancel_pending() {
            tracing::debug!("debounce cancelled by newer text");
            self.emit(OrchestratorEvent::DebounceCancelled).await;
        }

        if self.last_text.trim().is_empty() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tasks = self.tasks.clone();
        let delay = self.config.debounce;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tasks.send(TaskMessage::DebounceElapsed { generation }).await;
                }
            }
        });

        self.pending = Some(PendingDebounce { generation, token });
        self.emit(OrchestratorEvent::DebounceScheduled { delay }).await;
    }

    async fn debounce_elapsed(&mut self, generation: u64) {
        let current = matches!(
            &self.pending,
            Some(p) if p.generation == generation && !p.token.is_cancelled()
        );
        if !current {
            return;
        }
        self.pending = None;

        let text = self.last_text.clone();
        if self.in_flight.is_some() {
            tracing::debug!("extraction already running, deferring");
            self.deferred = Some(text);
            self.emit(OrchestratorEvent::ExtractionDeferred).await;
        } else {
            self.start_extraction(text).await;
        }
    }

    async fn run_deferred(&mut self) {
        if let Some(text) = self.deferred.take() {
            self.start_extraction(text).await;
        }
    }

    async fn start_extraction(&mut self, text: String) {
        let chars = text.chars().count();
        tracing::info!(chars, "starting extraction");

        let model = Arc::clone(&self.model);
        self.spawn_model_call(
            async move { model.extract(&text).await },
            TaskMessage::ExtractionDone,
        );

        self.emit(OrchestratorEvent::ExtractionStarted { chars }).await;
    }

    async fn retry(&mut self, name: String) {
        let refusal = if self.in_flight.is_some() {
            Some(UpdateError::Busy)
        } else if self.last_text.trim().is_empty() {
            Some(UpdateError::NoText)
        } else if self.manager.get_object(&name).is_none() {
            Some(UpdateError::NotFound { name: name.clone() })
        } else {
            None
        };

        if let Some(error) = refusal {
            tracing::debug!(object = %name, error = %error, "retry refused");
            let result = self.manager.failure(error);
            self.emit(OrchestratorEvent::CorrectionFinished { name, result }).await;
            return;
        }

        tracing::info!(object = %name, "starting correction");
        let model = Arc::clone(&self.model);
        let full_text = self.last_text.clone();
        let task_name = name.clone();
        let reply_name = name.clone();
        self.spawn_model_call(
            async move { model.correct(&task_name, &full_text).await },
            move |result| TaskMessage::CorrectionDone {
                name: reply_name,
                result,
            },
        );

        self.emit(OrchestratorEvent::CorrectionStarted { name }).await;
    }

    /// Run a model call on its own task and report back when it ends.
    ///
    /// A call that panics is reported as a failed result, so the
    /// single-flight guard is always released.
    fn spawn_model_call<F, M>(&mut self, call: F, done: M)
    where
        F: Future<Output = Result<String, llm_client::Error>> + Send + 'static,
        M: FnOnce(Result<String, UpdateError>) -> TaskMessage + Send + 'static,
    {
        let call = tokio::spawn(call);
        self.in_flight = Some(call.abort_handle());

        let tasks = self.tasks.clone();
        tokio::spawn(async move {
            let result = match call.await {
                Ok(result) => result.map_err(UpdateError::from),
                Err(e) if e.is_cancelled() => return,
                Err(e) => {
                    tracing::error!(error = %e, "model call crashed");
                    Err(UpdateError::Crashed(e.to_string()))
                }
            };
            let _ = tasks.send(done(result)).await;
        });
    }

    /// Cancel the pending debounce. Returns true if there was one.
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.token.cancel();
                true
            }
            None => false,
        }
    }

    async fn emit(&self, event: OrchestratorEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}
