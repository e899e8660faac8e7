//! Editor installer CLI entrypoint.
//!
//! This binary provisions the Cardinal Editor into the current project, or
//! checks the host for the tools the development workflow needs.

use clap::Parser;
use log::LevelFilter;
use std::io::Write;

use editor_installer::cli::{Cli, Command, DoctorArgs, SetupArgs};
use editor_installer::deps::{SystemCommandExecutor, check_all, standard_dependencies};
use editor_installer::dirs::SystemBaseDirs;
use editor_installer::error::Result;
use editor_installer::output::{error_chain, success_message, write_stderr_line};
use editor_installer::pipeline::setup_editor;

fn main() {
    let cli = Cli::parse();
    init_logging(log_level_for(&cli));
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Some(Command::Doctor(args)) => run_doctor(args, stderr),
        Some(Command::Setup(_)) | None => run_setup(cli.setup_args(), stderr),
    }
}

fn run_setup(args: &SetupArgs, stderr: &mut dyn Write) -> Result<()> {
    let config = args.resolve_config()?;
    let outcome = setup_editor(&config, &SystemBaseDirs::new())?;

    if !args.quiet {
        write_stderr_line(stderr, success_message(&outcome, &config.project_dir));
    }
    Ok(())
}

fn run_doctor(args: &DoctorArgs, stderr: &mut dyn Write) -> Result<()> {
    let executor = SystemCommandExecutor;
    let dependencies = standard_dependencies(&executor);
    check_all(&executor, &dependencies)?;

    if !args.quiet {
        for dependency in &dependencies {
            write_stderr_line(stderr, format!("{}: ok", dependency.name));
        }
    }
    Ok(())
}

fn log_level_for(cli: &Cli) -> LevelFilter {
    match &cli.command {
        Some(Command::Doctor(args)) if args.quiet => LevelFilter::Error,
        Some(Command::Doctor(_)) => LevelFilter::Info,
        Some(Command::Setup(_)) | None => cli.setup_args().log_level(),
    }
}

/// Install `env_logger` at `level`; `RUST_LOG` takes precedence.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .init();
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, error_chain(&err));
            1
        }
    }
}
