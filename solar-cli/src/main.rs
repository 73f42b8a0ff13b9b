use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use solar_cli::{Cli, Outcome, PlainRenderer, Settings, Terminal, app, logging};

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli).context("Failed to load settings")?;

    logging::init_logging(&settings.logging.level);
    if !settings.logging.console {
        logging::set_console_enabled(false)?;
    }
    if let Some(path) = &settings.logging.file {
        logging::enable_file_logging(path)?;
    }

    debug!(backend = %settings.services.backend, "building session");
    let registry = app::build_registry();
    let mut session = app::build_session(&settings, &registry).await?;

    let stdin = io::stdin();
    let mut terminal = Terminal::new(stdin.lock(), PlainRenderer::new(io::stdout()));
    let outcome = terminal.run(&mut session).await?;

    match outcome {
        Outcome::Submitted => info!("quote request submitted"),
        Outcome::Abandoned => info!("quote request not submitted"),
    }
    logging::disable_file_logging();
    Ok(())
}
