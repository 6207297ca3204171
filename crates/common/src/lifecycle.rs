//! Submission and lifecycle actions
//!
//! Create, resize and suspend run strictly one after another. A later failure
//! leaves earlier work in place; nothing is rolled back.

use std::time::Duration;
use tracing::info;

use crate::compute::ComputeApi;
use crate::config::ProviderConfig;
use crate::operation::{OperationWaiter, WaitOutcome};
use crate::types::{InstanceSpec, Target};
use crate::Result;

/// Runs actions against one project and zone
pub struct Lifecycle<'a, A: ComputeApi + ?Sized> {
    api: &'a A,
    target: Target,
    timeout: Duration,
    poll_interval: Duration,
}

/// Follow-up steps after a create
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUp {
    /// Resize the instance's boot disk to this many GB
    pub resize_gb: Option<u64>,
    /// Suspend the instance once everything else is done
    pub suspend: bool,
}

/// Completed step of a [`Lifecycle::provision`] run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Created,
    Resized(u64),
    Suspended,
}

/// What a [`Lifecycle::provision`] run did
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub created: WaitOutcome,
    pub resized: Option<WaitOutcome>,
    pub suspended: Option<WaitOutcome>,
}

impl<'a, A: ComputeApi + ?Sized> Lifecycle<'a, A> {
    pub fn new(api: &'a A, target: Target, config: &ProviderConfig) -> Self {
        Self {
            api,
            target,
            timeout: config.operation_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn waiter(&self) -> OperationWaiter<'_, A> {
        OperationWaiter::new(self.api, &self.target, self.timeout)
            .with_poll_interval(self.poll_interval)
    }

    /// Submit `spec` and wait for the instance to exist
    pub async fn create(&self, spec: &InstanceSpec) -> Result<WaitOutcome> {
        info!(instance = %spec.name(), target = %self.target, "Creating instance");
        let operation = self.api.insert_instance(&self.target, spec).await?;
        self.waiter()
            .wait(operation, &format!("create instance {}", spec.name()))
            .await
    }

    /// Resize a disk. Shrinking is refused by the provider, not here.
    pub async fn resize_disk(&self, disk: &str, size_gb: u64) -> Result<WaitOutcome> {
        let current = self.api.get_disk(&self.target, disk).await?;
        info!(
            disk = %disk,
            current_gb = ?current.size_gb,
            target_gb = size_gb,
            "Resizing disk"
        );
        let operation = self.api.resize_disk(&self.target, disk, size_gb).await?;
        self.waiter()
            .wait(operation, &format!("resize disk {}", disk))
            .await
    }

    /// Suspend an existing instance
    pub async fn suspend(&self, instance: &str) -> Result<WaitOutcome> {
        info!(instance = %instance, "Suspending instance");
        let operation = self.api.suspend_instance(&self.target, instance).await?;
        self.waiter()
            .wait(operation, &format!("suspend instance {}", instance))
            .await
    }

    /// Create, then apply `follow_up`. The boot disk carries the instance's
    /// name, which is what the provider assigns when none is given.
    /// `on_step` is called after each completed step.
    pub async fn provision<F>(
        &self,
        spec: &InstanceSpec,
        follow_up: &FollowUp,
        mut on_step: F,
    ) -> Result<ProvisionReport>
    where
        F: FnMut(Step, &WaitOutcome),
    {
        let created = self.create(spec).await?;
        on_step(Step::Created, &created);

        let resized = match follow_up.resize_gb {
            Some(size_gb) => {
                let outcome = self.resize_disk(spec.name(), size_gb).await?;
                on_step(Step::Resized(size_gb), &outcome);
                Some(outcome)
            }
            None => None,
        };

        let suspended = if follow_up.suspend {
            let outcome = self.suspend(spec.name()).await?;
            on_step(Step::Suspended, &outcome);
            Some(outcome)
        } else {
            None
        };

        Ok(ProvisionReport {
            created,
            resized,
            suspended,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::InstanceBuilder;
    use crate::operation::{Operation, OperationErrorBody, OperationErrorEntry, OperationStatus};
    use crate::testing::ScriptedApi;
    use crate::types::DiskDescriptor;
    use crate::Error;

    fn config() -> ProviderConfig {
        ProviderConfig {
            project: Some("lab".to_string()),
            poll_interval_secs: 0,
            ..Default::default()
        }
    }

    fn disk(name: &str, size_gb: u64) -> DiskDescriptor {
        DiskDescriptor {
            name: name.to_string(),
            size_gb: Some(size_gb),
            status: Some("READY".to_string()),
            disk_type: None,
        }
    }

    fn failed(name: &str) -> Operation {
        Operation {
            name: name.to_string(),
            status: OperationStatus::Done,
            error: Some(OperationErrorBody {
                errors: vec![OperationErrorEntry {
                    code: "RESOURCE_NOT_READY".to_string(),
                    message: "not ready".to_string(),
                }],
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_json_sample_creates_once() {
        let config = config();
        let built = InstanceBuilder::new(&config)
            .from_json(
                r#"{"name":"vm-a","machineType":"zones/z/machineTypes/n1-standard-1","disks":[{"type":"PERSISTENT","boot":true,"autoDelete":true,"deviceName":"boot","diskSizeGb":"10"}],"networkInterfaces":[{"name":"nic0","network":"global/networks/default"}]}"#,
            )
            .unwrap();

        let api = ScriptedApi::new();
        let lifecycle = Lifecycle::new(&api, built.target.clone(), &config);
        lifecycle.create(&built.spec).await.unwrap();

        assert_eq!(api.calls(), vec!["insert vm-a"]);
        let submitted = api.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].boot_disk().unwrap().size_gb(), Some(10));
        assert_eq!(submitted[0].network_interfaces()[0].name.as_deref(), Some("nic0"));
    }

    #[tokio::test]
    async fn test_bad_config_never_reaches_api() {
        let config = config();
        let api = ScriptedApi::new();

        let built = InstanceBuilder::new(&config).from_json(r#"{"name": "vm-a"}"#);
        assert!(matches!(built, Err(Error::Config(_))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provision_runs_in_order() {
        let config = config();
        let spec = InstanceSpec::builder("vm-a", "e2-small").build().unwrap();
        let api = ScriptedApi::new().with_disk(disk("vm-a", 10));
        let lifecycle = Lifecycle::new(&api, config.target().unwrap(), &config);

        let mut steps = Vec::new();
        let report = lifecycle
            .provision(
                &spec,
                &FollowUp {
                    resize_gb: Some(100),
                    suspend: true,
                },
                |step, _| steps.push(step),
            )
            .await
            .unwrap();

        assert_eq!(steps, vec![Step::Created, Step::Resized(100), Step::Suspended]);

        assert_eq!(
            api.calls(),
            vec!["insert vm-a", "get_disk vm-a", "resize vm-a 100", "suspend vm-a"]
        );
        assert!(report.resized.is_some());
        assert!(report.suspended.is_some());
    }

    #[tokio::test]
    async fn test_failed_resize_leaves_instance_and_skips_suspend() {
        let config = config();
        let spec = InstanceSpec::builder("vm-a", "e2-small").build().unwrap();
        let api = ScriptedApi::new()
            .with_disk(disk("vm-a", 10))
            .with_result("resize", Ok(failed("op-resize")));
        let lifecycle = Lifecycle::new(&api, config.target().unwrap(), &config);

        let mut steps = Vec::new();
        let err = lifecycle
            .provision(
                &spec,
                &FollowUp {
                    resize_gb: Some(100),
                    suspend: true,
                },
                |step, _| steps.push(step),
            )
            .await
            .unwrap_err();

        assert_eq!(steps, vec![Step::Created]);

        assert!(matches!(err, Error::Operation { ref code, .. } if code == "RESOURCE_NOT_READY"));
        let calls = api.calls();
        assert_eq!(calls, vec!["insert vm-a", "get_disk vm-a", "resize vm-a 100"]);
        assert!(!calls.iter().any(|c| c.starts_with("delete")));
    }

    #[tokio::test]
    async fn test_resize_unknown_disk() {
        let config = config();
        let api = ScriptedApi::new();
        let lifecycle = Lifecycle::new(&api, config.target().unwrap(), &config);

        let err = lifecycle.resize_disk("missing", 20).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(api.calls(), vec!["get_disk missing"]);
    }

    #[tokio::test]
    async fn test_suspend_waits_for_operation() {
        let config = config();
        let pending = Operation {
            name: "op-suspend".to_string(),
            status: OperationStatus::Running,
            ..Default::default()
        };
        let done = Operation {
            status: OperationStatus::Done,
            ..pending.clone()
        };
        let api = ScriptedApi::new()
            .with_result("suspend", Ok(pending))
            .with_polls([done]);
        let lifecycle = Lifecycle::new(&api, config.target().unwrap(), &config);

        let outcome = lifecycle.suspend("vm-a").await.unwrap();
        assert!(outcome.operation.is_done());
        assert_eq!(api.calls(), vec!["suspend vm-a", "wait op-suspend"]);
    }
}
