mod cli;
mod commands;
mod host;
mod runtime;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries hook and command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = &cli.runtime;

    match cli.command {
        Commands::ValidateConfig => commands::validate_config::run(runtime),
        Commands::DryRun { input } => commands::dry_run::run(runtime, &input),
        Commands::Compact {
            input,
            session,
            output,
        } => commands::compact::run(runtime, &input, &session, output.as_deref()),
        Commands::CreateConfig { output } => commands::create_config::run(&output),
        Commands::Version => commands::version::run(),
        Commands::HookBeforeModelCall => commands::hooks::hook_before_model_call(runtime),
    }
}
