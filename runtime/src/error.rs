use std::time::Duration;

use workbench_types::Runtime;

/// A side-effecting call the initializer may make to move a runtime along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeAction {
    Create,
    Delete,
    Resume,
}

impl RuntimeAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RuntimeAction::Create => "create",
            RuntimeAction::Delete => "delete",
            RuntimeAction::Resume => "resume",
        }
    }
}

impl std::fmt::Display for RuntimeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why initialization gave up. Every variant carries the last runtime observed, if
/// any, so callers can show where it got stuck.
#[derive(Debug, thiserror::Error)]
pub enum InitializerError {
    #[error("reached max runtime {action} count ({limit})")]
    ExceededActionCount {
        action: RuntimeAction,
        limit: u32,
        runtime: Option<Runtime>,
    },
    #[error("reached max server error count ({limit})")]
    ExceededErrorCount { limit: u32, runtime: Option<Runtime> },
    #[error("runtime initialization was aborted")]
    Aborted { runtime: Option<Runtime> },
    #[error(
        "initialization took longer than the max time allowed ({}ms)",
        .timeout.as_millis()
    )]
    TimedOut {
        timeout: Duration,
        runtime: Option<Runtime>,
    },
}

impl InitializerError {
    #[must_use]
    pub fn runtime(&self) -> Option<&Runtime> {
        match self {
            Self::ExceededActionCount { runtime, .. }
            | Self::ExceededErrorCount { runtime, .. }
            | Self::Aborted { runtime }
            | Self::TimedOut { runtime, .. } => runtime.as_ref(),
        }
    }

    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}
