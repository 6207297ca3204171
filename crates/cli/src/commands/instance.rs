//! Instance Commands

use anyhow::Result;
use clap::Args;

use vmprov_common::{Lifecycle, ProviderConfig};

use crate::output::{
    self, print_item, print_operation_warnings, print_success, OperationDisplay, OutputFormat,
};

#[derive(Args, Debug)]
pub struct SuspendArgs {
    /// Instance name
    pub instance: String,
}

pub async fn suspend(args: SuspendArgs, config: &ProviderConfig, format: OutputFormat) -> Result<()> {
    let (client, target) = super::connect(config)?;
    let lifecycle = Lifecycle::new(&client, target, config);

    let spinner = output::spinner(format, &format!("Suspending instance '{}'...", args.instance));
    let result = lifecycle.suspend(&args.instance).await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let outcome = result?;
    print_success(&format!("Instance '{}' suspended.", args.instance));
    print_operation_warnings(&outcome.warnings);
    print_item(&OperationDisplay::from(&outcome), format);

    Ok(())
}
