use anyhow::{Context, Result};
use clap::Parser;
use quill_cli::cli::{Cli, Commands};
use quill_cli::{commands, logging};
use quill_config::QuillConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = QuillConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    cli.apply_overrides(&mut config);

    logging::init(cli.level_override(), &config.logging.level);

    match cli.command {
        Some(Commands::Eval { expr, .. }) => {
            let evaluation = commands::eval(&config, &expr)?;
            commands::print_evaluation(
                &evaluation,
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            )?;
        }
        Some(Commands::Serve) | None => {
            info!(address = %config.server.bind_address(), "Starting Quill");
            commands::serve(config).await?;
        }
    }
    Ok(())
}
