//! synctool-deploy CLI - build, install and strip synctool

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

use synctool_deploy::ops::{deploy, DeployOptions, DeployOutcome};
use synctool_deploy::pipeline::{PipelineError, PipelineReport};
use synctool_deploy::util::shell::{format_duration, format_size, Status};
use synctool_deploy::util::{GlobalContext, Shell};

mod cli;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color);

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("synctool_deploy=debug")
    } else if cli.quiet {
        EnvFilter::new("synctool_deploy=error")
    } else {
        EnvFilter::new("synctool_deploy=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(shell.use_color())
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(&cli, &shell) {
        eprintln!("error: {:#}", e);

        let code = match e.downcast_ref::<PipelineError>() {
            Some(failure) => {
                if let Some(help) = failure.help() {
                    eprintln!("help: {}", help);
                }
                failure.exit_code()
            }
            None => 1,
        };
        std::process::exit(code);
    }
}

fn run(cli: &Cli, shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let opts = DeployOptions {
        config_path: cli.config.clone(),
        print_only: cli.print,
    };

    match deploy(&ctx, shell, &opts)? {
        DeployOutcome::Planned(commands) => {
            for command in commands {
                println!("{}", command);
            }
        }
        DeployOutcome::Deployed(report) => summarize(shell, &report),
    }

    Ok(())
}

fn summarize(shell: &Shell, report: &PipelineReport) {
    if let Some(deployed) = &report.deployed {
        shell.status(
            Status::Installed,
            format!(
                "{} (sha256 {})",
                deployed.path.display(),
                &deployed.sha256[..deployed.sha256.len().min(12)]
            ),
        );

        if let Some(stripped) = deployed.stripped_size {
            shell.status(
                Status::Stripped,
                format!("{} -> {}", format_size(deployed.size), format_size(stripped)),
            );
            if stripped >= deployed.size {
                shell.warn(format!(
                    "stripping did not shrink {}; was it already stripped?",
                    deployed.path.display()
                ));
            }
        }
    }

    shell.status(
        Status::Finished,
        format!("in {}", format_duration(report.elapsed)),
    );
}
