//! Long-running operation handling
//!
//! Every mutating call returns an [`Operation`]. [`OperationWaiter`] polls it
//! until the provider marks it `DONE`, then turns the terminal state into
//! either a result, an [`Error::Operation`], or a result with logged warnings.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::compute::ComputeApi;
use crate::types::Target;
use crate::{Error, Result};

/// Operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
    #[serde(other)]
    Unknown,
}

impl Default for OperationStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Pending => write!(f, "pending"),
            OperationStatus::Running => write!(f, "running"),
            OperationStatus::Done => write!(f, "done"),
            OperationStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Single error entry reported by a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorEntry {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Error block of a failed operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorBody {
    #[serde(default)]
    pub errors: Vec<OperationErrorEntry>,
}

/// Non-fatal warning attached to an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationWarning {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for OperationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Provider-side asynchronous task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub status: OperationStatus,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub target_link: Option<String>,
    #[serde(default)]
    pub error: Option<OperationErrorBody>,
    #[serde(default)]
    pub warnings: Vec<OperationWarning>,
    #[serde(default)]
    pub http_error_status_code: Option<u16>,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    /// First reported error, if the operation failed
    pub fn failure(&self) -> Option<&OperationErrorEntry> {
        self.error.as_ref().and_then(|e| e.errors.first())
    }
}

/// Terminal, successful operation together with the warnings it carried
#[derive(Debug, Clone)]
pub struct WaitOutcome {
    pub operation: Operation,
    pub warnings: Vec<OperationWarning>,
}

/// Blocks on operations until they reach a terminal state or time out
pub struct OperationWaiter<'a, A: ComputeApi + ?Sized> {
    api: &'a A,
    target: &'a Target,
    timeout: Duration,
    poll_interval: Duration,
}

impl<'a, A: ComputeApi + ?Sized> OperationWaiter<'a, A> {
    pub fn new(api: &'a A, target: &'a Target, timeout: Duration) -> Self {
        Self {
            api,
            target,
            timeout,
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Wait for `operation` to finish. `label` names the action in logs and
    /// errors, e.g. "create instance vm-a".
    pub async fn wait(&self, operation: Operation, label: &str) -> Result<WaitOutcome> {
        let id = operation.name.clone();
        info!(operation = %id, "Waiting for {}", label);

        let done = match tokio::time::timeout(self.timeout, self.poll_until_done(operation)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Timeout {
                    label: label.to_string(),
                    seconds: self.timeout.as_secs(),
                    operation: id,
                })
            }
        };

        resolve(done, label)
    }

    async fn poll_until_done(&self, mut operation: Operation) -> Result<Operation> {
        loop {
            if operation.is_done() {
                return Ok(operation);
            }
            debug!(operation = %operation.name, status = %operation.status, "Polling operation");
            operation = self.api.wait_operation(self.target, &operation.name).await?;
            if !operation.is_done() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }
}

/// Interpret a finished operation
fn resolve(operation: Operation, label: &str) -> Result<WaitOutcome> {
    if let Some(entry) = operation.failure() {
        return Err(Error::Operation {
            label: label.to_string(),
            code: entry.code.clone(),
            message: entry.message.clone(),
            operation: operation.name.clone(),
        });
    }

    for warning in &operation.warnings {
        warn!(operation = %operation.name, code = %warning.code, "{}: {}", label, warning.message);
    }

    let warnings = operation.warnings.clone();
    Ok(WaitOutcome {
        operation,
        warnings,
    })
}
