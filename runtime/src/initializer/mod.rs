//! The poll loop that drives a workspace runtime to a usable state.
//!
//! Each cycle:
//!
//! 1. Bail out if cancelled or past the overall timeout.
//! 2. Fetch the runtime (404 means there is none).
//! 3. Resolve if the goal condition holds; otherwise create, resume or delete as the
//!    status calls for. Each action has its own budget.
//! 4. Sleep with capped exponential backoff.
//!
//! Network calls and the sleep race the cancellation token, so an abort takes effect
//! immediately and no call is issued after it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use workbench_client::{ApiError, WorkbenchClient};
use workbench_types::{
    Runtime, RuntimePreset, RuntimeStatus, WorkspaceNamespace, apply_preset_override,
};

use crate::backoff::PollingBackoff;
use crate::error::{InitializerError, RuntimeAction};
use crate::store::RuntimeStore;

/// Tuning knobs. The defaults suit an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializerOptions {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub overall_timeout: Duration,
    pub max_create_count: u32,
    pub max_delete_count: u32,
    pub max_resume_count: u32,
    pub max_server_error_count: u32,
}

impl Default for InitializerOptions {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
            overall_timeout: Duration::from_secs(20 * 60),
            max_create_count: 2,
            max_delete_count: 2,
            max_resume_count: 2,
            max_server_error_count: 10,
        }
    }
}

/// What the last fetch said.
#[derive(Debug)]
enum Observation {
    /// No fetch has succeeded yet.
    Pending,
    /// 404.
    Absent,
    Present(Runtime),
}

impl Observation {
    fn runtime(&self) -> Option<&Runtime> {
        match self {
            Observation::Present(runtime) => Some(runtime),
            Observation::Pending | Observation::Absent => None,
        }
    }
}

type ResolutionCondition<'a> = Box<dyn Fn(&Runtime) -> bool + Send + Sync + 'a>;
type PollCallback<'a> = Box<dyn FnMut(Option<&Runtime>) + Send + 'a>;

/// Polls one workspace's runtime until `resolve_when` holds.
///
/// ```rust,no_run
/// # async fn example(client: workbench_client::WorkbenchClient) {
/// use tokio_util::sync::CancellationToken;
/// use workbench_runtime::RuntimeInitializer;
/// use workbench_types::WorkspaceNamespace;
///
/// let namespace = WorkspaceNamespace::new("aou-rw-123").unwrap();
/// let runtime = RuntimeInitializer::new(&client, namespace)
///     .with_cancellation(CancellationToken::new())
///     .on_poll(|runtime| println!("status: {:?}", runtime.and_then(|r| r.status)))
///     .run()
///     .await;
/// # let _ = runtime;
/// # }
/// ```
pub struct RuntimeInitializer<'a> {
    client: &'a WorkbenchClient,
    namespace: WorkspaceNamespace,
    options: InitializerOptions,
    target_runtime: Option<Runtime>,
    resolution: ResolutionCondition<'a>,
    on_poll: PollCallback<'a>,
    cancel: CancellationToken,
    store: Option<RuntimeStore>,

    observed: Observation,
    create_count: u32,
    delete_count: u32,
    resume_count: u32,
    server_error_count: u32,
}

impl std::fmt::Debug for RuntimeInitializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeInitializer")
            .field("namespace", &self.namespace)
            .field("options", &self.options)
            .field("observed", &self.observed)
            .field("create_count", &self.create_count)
            .field("delete_count", &self.delete_count)
            .field("resume_count", &self.resume_count)
            .field("server_error_count", &self.server_error_count)
            .finish_non_exhaustive()
    }
}

impl<'a> RuntimeInitializer<'a> {
    #[must_use]
    pub fn new(client: &'a WorkbenchClient, namespace: WorkspaceNamespace) -> Self {
        Self {
            client,
            namespace,
            options: InitializerOptions::default(),
            target_runtime: None,
            resolution: Box::new(|runtime| runtime.has_status(RuntimeStatus::Running)),
            on_poll: Box::new(|_| {}),
            cancel: CancellationToken::new(),
            store: None,
            observed: Observation::Pending,
            create_count: 0,
            delete_count: 0,
            resume_count: 0,
            server_error_count: 0,
        }
    }

    pub fn with_options(mut self, options: InitializerOptions) -> Self {
        self.options = options;
        self
    }

    /// Configuration to send when a runtime has to be created.
    pub fn with_target_runtime(mut self, runtime: Runtime) -> Self {
        self.target_runtime = Some(runtime);
        self
    }

    /// Goal condition. Defaults to `status == Running`.
    pub fn resolve_when(mut self, condition: impl Fn(&Runtime) -> bool + Send + Sync + 'a) -> Self {
        self.resolution = Box::new(condition);
        self
    }

    /// Called after every successful fetch, with `None` when there is no runtime.
    pub fn on_poll(mut self, callback: impl FnMut(Option<&Runtime>) + Send + 'a) -> Self {
        self.on_poll = Box::new(callback);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Publish every poll result to `store`.
    pub fn with_store(mut self, store: RuntimeStore) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn run(mut self) -> Result<Runtime, InitializerError> {
        let started = Instant::now();
        let mut backoff = PollingBackoff::new(self.options.initial_delay, self.options.max_delay);
        tracing::info!(namespace = %self.namespace, "Initializing runtime");

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.aborted());
            }
            if started.elapsed() > self.options.overall_timeout {
                return Err(InitializerError::TimedOut {
                    timeout: self.options.overall_timeout,
                    runtime: self.last_runtime(),
                });
            }

            self.fetch().await?;

            if let Some(runtime) = self.observed.runtime()
                && (self.resolution)(runtime)
            {
                tracing::info!(runtime = %runtime.display_id(), "Runtime is ready");
                return Ok(runtime.clone());
            }

            self.act().await?;

            let delay = backoff.next_delay();
            tracing::debug!(delay_ms = delay.as_millis(), "Waiting before next poll");
            if until_cancelled(&self.cancel, tokio::time::sleep(delay))
                .await
                .is_none()
            {
                return Err(self.aborted());
            }
        }
    }

    async fn fetch(&mut self) -> Result<(), InitializerError> {
        let Some(result) =
            until_cancelled(&self.cancel, self.client.get_runtime(&self.namespace)).await
        else {
            return Err(self.aborted());
        };

        match result {
            Ok(runtime) => {
                tracing::debug!(
                    namespace = %self.namespace,
                    status = runtime
                        .as_ref()
                        .and_then(|r| r.status)
                        .map_or("none", RuntimeStatus::as_str),
                    "Polled runtime"
                );
                if let Some(store) = &self.store {
                    store.record(&self.namespace, runtime.clone());
                }
                (self.on_poll)(runtime.as_ref());
                self.observed = match runtime {
                    Some(runtime) => Observation::Present(runtime),
                    None => Observation::Absent,
                };
                Ok(())
            }
            Err(err) => self.record_failure("get", &err),
        }
    }

    /// The action the last observation calls for, if any. A failed fetch leaves the
    /// previous observation in place, so the decision may be based on it.
    fn next_action(&self) -> Option<RuntimeAction> {
        match &self.observed {
            Observation::Pending => None,
            Observation::Absent => Some(RuntimeAction::Create),
            Observation::Present(runtime) => match runtime.status {
                Some(RuntimeStatus::Deleted) => Some(RuntimeAction::Create),
                Some(RuntimeStatus::Stopped) => Some(RuntimeAction::Resume),
                Some(RuntimeStatus::Error) => {
                    tracing::warn!(
                        runtime = %runtime.display_id(),
                        "Runtime has reached an ERROR status"
                    );
                    Some(RuntimeAction::Delete)
                }
                _ => None,
            },
        }
    }

    async fn act(&mut self) -> Result<(), InitializerError> {
        let Some(action) = self.next_action() else {
            return Ok(());
        };

        let (count, limit) = match action {
            RuntimeAction::Create => (self.create_count, self.options.max_create_count),
            RuntimeAction::Delete => (self.delete_count, self.options.max_delete_count),
            RuntimeAction::Resume => (self.resume_count, self.options.max_resume_count),
        };
        if count >= limit {
            return Err(InitializerError::ExceededActionCount {
                action,
                limit,
                runtime: self.last_runtime(),
            });
        }

        tracing::info!(
            %action,
            attempt = count + 1,
            limit,
            namespace = %self.namespace,
            "Runtime action"
        );
        let outcome = match action {
            RuntimeAction::Create => {
                let body = self.create_body();
                until_cancelled(
                    &self.cancel,
                    self.client.create_runtime(&self.namespace, &body),
                )
                .await
            }
            RuntimeAction::Delete => {
                until_cancelled(&self.cancel, self.client.delete_runtime(&self.namespace)).await
            }
            RuntimeAction::Resume => {
                let Some((project, name)) = self.observed.runtime().and_then(|runtime| {
                    Some((
                        runtime.google_project.clone()?,
                        runtime.runtime_name.clone()?,
                    ))
                }) else {
                    tracing::warn!("Stopped runtime has no project or name; cannot resume");
                    self.resume_count += 1;
                    return Ok(());
                };
                until_cancelled(&self.cancel, self.client.start_runtime(&project, &name)).await
            }
        };

        match outcome {
            None => Err(self.aborted()),
            Some(Ok(())) => {
                match action {
                    RuntimeAction::Create => self.create_count += 1,
                    RuntimeAction::Delete => self.delete_count += 1,
                    RuntimeAction::Resume => self.resume_count += 1,
                }
                Ok(())
            }
            Some(Err(err)) => self.record_failure(action.as_str(), &err),
        }
    }

    /// Caller's target, else the last runtime with presets re-applied, else the
    /// general analysis template.
    fn create_body(&self) -> Runtime {
        if let Some(target) = &self.target_runtime {
            return target.clone();
        }
        match self.observed.runtime() {
            Some(runtime) => apply_preset_override(runtime),
            None => RuntimePreset::GeneralAnalysis.template(),
        }
    }

    /// Log a failed call. Server errors count toward the error budget.
    fn record_failure(&mut self, call: &str, err: &ApiError) -> Result<(), InitializerError> {
        tracing::warn!(call, namespace = %self.namespace, error = %err, "Runtime API call failed");
        if err.is_server_error() {
            self.server_error_count += 1;
            if self.server_error_count > self.options.max_server_error_count {
                return Err(InitializerError::ExceededErrorCount {
                    limit: self.options.max_server_error_count,
                    runtime: self.last_runtime(),
                });
            }
        }
        Ok(())
    }

    fn last_runtime(&self) -> Option<Runtime> {
        self.observed.runtime().cloned()
    }

    fn aborted(&self) -> InitializerError {
        tracing::info!(namespace = %self.namespace, "Runtime initialization aborted");
        InitializerError::Aborted {
            runtime: self.last_runtime(),
        }
    }
}

/// `None` if `token` fires first; the pending future is dropped.
async fn until_cancelled<F: Future>(token: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = token.cancelled() => None,
        output = future => Some(output),
    }
}

/// Initialize with default behavior: wait for `Running`, creating the general
/// analysis preset if there is no runtime.
pub async fn initialize(
    client: &WorkbenchClient,
    namespace: WorkspaceNamespace,
    options: InitializerOptions,
    cancel: CancellationToken,
) -> Result<Runtime, InitializerError> {
    RuntimeInitializer::new(client, namespace)
        .with_options(options)
        .with_cancellation(cancel)
        .run()
        .await
}
