//! Disk Commands

use anyhow::Result;
use clap::Args;

use vmprov_common::{Lifecycle, ProviderConfig};

use crate::output::{
    self, print_item, print_operation_warnings, print_success, OperationDisplay, OutputFormat,
};

#[derive(Args, Debug)]
pub struct ResizeDiskArgs {
    /// Disk name (a boot disk carries its instance's name)
    pub disk: String,

    /// New size in GB
    #[arg(long)]
    pub size_gb: u64,
}

pub async fn execute(args: ResizeDiskArgs, config: &ProviderConfig, format: OutputFormat) -> Result<()> {
    let (client, target) = super::connect(config)?;
    let lifecycle = Lifecycle::new(&client, target, config);

    let spinner = output::spinner(format, &format!("Resizing disk '{}'...", args.disk));
    let result = lifecycle.resize_disk(&args.disk, args.size_gb).await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let outcome = result?;
    print_success(&format!("Disk resized to {} GB.", args.size_gb));
    print_operation_warnings(&outcome.warnings);
    print_item(&OperationDisplay::from(&outcome), format);

    Ok(())
}
