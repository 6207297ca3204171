//! Create Command

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use vmprov_common::{BuildMode, FollowUp, InstanceBuilder, Lifecycle, ProviderConfig, Step};

use crate::client::ComputeClient;
use crate::output::{
    self, print_info, print_item, print_operation_warnings, print_success, print_warning,
    InstanceDisplay, OperationDisplay, OutputFormat,
};
use crate::prompt::TerminalPrompter;

/// How instance parameters are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ModeArg {
    /// Use the configured fixed profile
    #[default]
    Fixed,
    /// Ask for each value on the terminal
    Interactive,
    /// Read an instance configuration file
    Json,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Input mode
    #[arg(long, value_enum, default_value_t = ModeArg::Fixed)]
    pub mode: ModeArg,

    /// Instance configuration file (implies --mode json)
    #[arg(short, long, conflicts_with = "name")]
    pub file: Option<PathBuf>,

    /// Instance name for fixed mode
    #[arg(short, long)]
    pub name: Option<String>,

    /// Resize the boot disk to this many GB after creation
    #[arg(long)]
    pub resize_gb: Option<u64>,

    /// Suspend the instance after creation
    #[arg(long)]
    pub suspend: bool,

    /// Print the request instead of submitting it
    #[arg(long)]
    pub dry_run: bool,
}

impl CreateArgs {
    fn build_mode(&self) -> Result<BuildMode> {
        match (self.mode, &self.file) {
            (ModeArg::Interactive, Some(_)) => bail!("--file cannot be combined with --mode interactive"),
            (ModeArg::Interactive, None) => Ok(BuildMode::Interactive),
            (_, Some(path)) => Ok(BuildMode::Json(path.clone())),
            (ModeArg::Json, None) => bail!("--mode json needs --file <PATH>"),
            (ModeArg::Fixed, None) => Ok(BuildMode::Fixed),
        }
    }
}

pub async fn execute(args: CreateArgs, config: &ProviderConfig, format: OutputFormat) -> Result<()> {
    let mode = args.build_mode()?;

    let mut config = config.clone();
    if let Some(name) = &args.name {
        config.fixed.name = Some(name.clone());
    }

    let mut prompter = TerminalPrompter::new();
    let built = InstanceBuilder::new(&config).build(&mode, &mut prompter)?;
    for removed in &built.removed {
        print_warning(&removed.to_string());
    }

    if args.dry_run {
        print_info(&format!(
            "Dry run: instance '{}' would be created in {}",
            built.spec.name(),
            built.target
        ));
        println!("{}", serde_json::to_string_pretty(&built.spec)?);
        return Ok(());
    }

    let client = ComputeClient::from_config(&config)?;
    let lifecycle = Lifecycle::new(&client, built.target.clone(), &config);
    let follow_up = FollowUp {
        resize_gb: args.resize_gb,
        suspend: args.suspend,
    };

    let name = built.spec.name().to_string();
    let spinner = output::spinner(format, &format!("Creating instance '{}'...", name));
    let result = lifecycle
        .provision(&built.spec, &follow_up, |step, outcome| {
            output::suspend_spinner(spinner.as_ref(), || {
                match step {
                    Step::Created => print_success(&format!("Instance '{}' created.", name)),
                    Step::Resized(gb) => print_success(&format!("Disk resized to {} GB.", gb)),
                    Step::Suspended => print_success(&format!("Instance '{}' suspended.", name)),
                }
                print_operation_warnings(&outcome.warnings);
            });
        })
        .await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let report = result?;
    print_item(&InstanceDisplay::new(&built.target, &built.spec), format);
    print_item(&OperationDisplay::from(&report.created), format);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(mode: ModeArg, file: Option<&str>) -> CreateArgs {
        CreateArgs {
            mode,
            file: file.map(PathBuf::from),
            name: None,
            resize_gb: None,
            suspend: false,
            dry_run: false,
        }
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(args(ModeArg::Fixed, None).build_mode().unwrap(), BuildMode::Fixed);
        assert_eq!(
            args(ModeArg::Interactive, None).build_mode().unwrap(),
            BuildMode::Interactive
        );
        assert_eq!(
            args(ModeArg::Fixed, Some("vm.json")).build_mode().unwrap(),
            BuildMode::Json(PathBuf::from("vm.json"))
        );
        assert!(args(ModeArg::Json, None).build_mode().is_err());
        assert!(args(ModeArg::Interactive, Some("vm.json")).build_mode().is_err());
    }
}
