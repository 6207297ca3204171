//! In-memory [`ComputeApi`] for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::compute::ComputeApi;
use crate::operation::{Operation, OperationStatus};
use crate::types::{DiskDescriptor, InstanceSpec, Target};
use crate::{Error, Result};

/// Records every call and answers from a script.
///
/// Mutating calls return a `DONE` operation named `op-<action>` unless a
/// different result was scripted with [`ScriptedApi::with_result`].
#[derive(Default)]
pub struct ScriptedApi {
    calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<InstanceSpec>>,
    polls: Mutex<VecDeque<Operation>>,
    results: Mutex<HashMap<&'static str, Result<Operation>>>,
    disks: Mutex<HashMap<String, DiskDescriptor>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses handed out by successive `wait_operation` calls
    pub fn with_polls(self, polls: impl IntoIterator<Item = Operation>) -> Self {
        self.polls.lock().extend(polls);
        self
    }

    /// Result for `insert`, `resize` or `suspend`
    pub fn with_result(self, action: &'static str, result: Result<Operation>) -> Self {
        self.results.lock().insert(action, result);
        self
    }

    pub fn with_disk(self, disk: DiskDescriptor) -> Self {
        self.disks.lock().insert(disk.name.clone(), disk);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn submitted(&self) -> Vec<InstanceSpec> {
        self.submitted.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn answer(&self, action: &'static str) -> Result<Operation> {
        match self.results.lock().remove(action) {
            Some(result) => result,
            None => Ok(Operation {
                name: format!("op-{}", action),
                status: OperationStatus::Done,
                operation_type: Some(action.to_string()),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl ComputeApi for ScriptedApi {
    async fn insert_instance(&self, _target: &Target, spec: &InstanceSpec) -> Result<Operation> {
        self.record(format!("insert {}", spec.name()));
        self.submitted.lock().push(spec.clone());
        self.answer("insert")
    }

    async fn get_disk(&self, _target: &Target, disk: &str) -> Result<DiskDescriptor> {
        self.record(format!("get_disk {}", disk));
        self.disks
            .lock()
            .get(disk)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("disk {}", disk)))
    }

    async fn resize_disk(&self, _target: &Target, disk: &str, size_gb: u64) -> Result<Operation> {
        self.record(format!("resize {} {}", disk, size_gb));
        self.answer("resize")
    }

    async fn suspend_instance(&self, _target: &Target, instance: &str) -> Result<Operation> {
        self.record(format!("suspend {}", instance));
        self.answer("suspend")
    }

    async fn wait_operation(&self, _target: &Target, operation: &str) -> Result<Operation> {
        self.record(format!("wait {}", operation));
        self.polls
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Transport(format!("no scripted state for {}", operation)))
    }
}
