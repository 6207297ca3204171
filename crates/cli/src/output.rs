//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

use vmprov_common::{InstanceSpec, OperationWarning, Target, WaitOutcome};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            table.add_row(item.row());

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
        }
        OutputFormat::Plain => {
            let row = item.row();
            for (header, value) in T::headers().iter().zip(row.iter()) {
                println!("{}: {}", header, value);
            }
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "!".yellow(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".cyan(), message);
}

/// Print provider warnings carried by a finished operation
pub fn print_operation_warnings(warnings: &[OperationWarning]) {
    for warning in warnings {
        print_warning(&warning.to_string());
    }
}

/// Spinner shown while an operation is awaited; only in table mode
pub fn spinner(format: OutputFormat, message: &str) -> Option<ProgressBar> {
    if !matches!(format, OutputFormat::Table) {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Run `f` with the spinner (if any) hidden
pub fn suspend_spinner<R>(spinner: Option<&ProgressBar>, f: impl FnOnce() -> R) -> R {
    match spinner {
        Some(pb) => pb.suspend(f),
        None => f(),
    }
}

/// Summary of an instance request
#[derive(Serialize)]
pub struct InstanceDisplay {
    pub name: String,
    pub project: String,
    pub zone: String,
    pub machine_type: String,
    pub boot_disk_gb: Option<u64>,
    pub extra_disks: usize,
    pub networks: Vec<String>,
}

impl InstanceDisplay {
    pub fn new(target: &Target, spec: &InstanceSpec) -> Self {
        Self {
            name: spec.name().to_string(),
            project: target.project.clone(),
            zone: target.zone.clone(),
            machine_type: spec
                .machine_type()
                .rsplit('/')
                .next()
                .unwrap_or(spec.machine_type())
                .to_string(),
            boot_disk_gb: spec.boot_disk().and_then(|d| d.size_gb()),
            extra_disks: spec.additional_disks().count(),
            networks: spec
                .network_interfaces()
                .iter()
                .map(|nic| nic.network.clone())
                .collect(),
        }
    }
}

impl TableDisplay for InstanceDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Project", "Zone", "Machine", "Boot Disk", "Extra Disks", "Networks"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.project.clone(),
            self.zone.clone(),
            self.machine_type.clone(),
            self.boot_disk_gb
                .map(|gb| format!("{}GB", gb))
                .unwrap_or_else(|| "-".to_string()),
            self.extra_disks.to_string(),
            self.networks.join(", "),
        ]
    }
}

/// Summary of a finished operation
#[derive(Serialize)]
pub struct OperationDisplay {
    pub operation: String,
    pub kind: String,
    pub status: String,
    pub target: String,
    pub warnings: usize,
}

impl From<&WaitOutcome> for OperationDisplay {
    fn from(outcome: &WaitOutcome) -> Self {
        let op = &outcome.operation;
        Self {
            operation: op.name.clone(),
            kind: op.operation_type.clone().unwrap_or_default(),
            status: op.status.to_string(),
            target: op
                .target_link
                .as_deref()
                .and_then(|link| link.rsplit('/').next())
                .unwrap_or_default()
                .to_string(),
            warnings: outcome.warnings.len(),
        }
    }
}

impl TableDisplay for OperationDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Operation", "Type", "Status", "Target", "Warnings"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.operation.clone(),
            self.kind.clone(),
            self.status.clone(),
            self.target.clone(),
            self.warnings.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmprov_common::{AttachedDisk, NetworkInterface};

    #[test]
    fn test_instance_display_row() {
        let spec = InstanceSpec::builder("vm-a", "zones/z/machineTypes/e2-small")
            .with_disk(AttachedDisk::boot_from_image("img", 20))
            .with_disk(AttachedDisk::blank(50))
            .with_network_interface(NetworkInterface::default_with_nat())
            .build()
            .unwrap();
        let display = InstanceDisplay::new(&Target::new("lab", "z"), &spec);

        assert_eq!(display.machine_type, "e2-small");
        let row = display.row();
        assert_eq!(row.len(), InstanceDisplay::headers().len());
        assert_eq!(row[4], "20GB");
        assert_eq!(row[5], "1");
        assert_eq!(row[6], "global/networks/default");
    }
}
