mod cli;
mod commands;
mod error;

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    error::Result,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use live_engine::CancellationToken;
use std::process;
use tracing::{Level, debug, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug, args.quiet);

    let verbose = args.debug;
    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        let message = if verbose { format!("{e:?}") } else { e.to_string() };
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {}", message);
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let token = CancellationToken::new();
    spawn_interrupt_handler(token.clone());

    let executor = CommandExecutor::new(&args, token)?;

    match &args.command {
        Commands::Channels => executor.list_channels()?,
        Commands::Live { channel } => executor.play_live(channel).await?,
        Commands::Episode { target } => executor.play_episode(target).await?,
    }

    Ok(())
}

/// Cancels `token` on Ctrl-C so the follower stops between fetches.
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received interrupt, shutting down");
                token.cancel();
            }
            Err(e) => debug!(error = %e, "Interrupt handler unavailable"),
        }
    });
}

/// Logs go to stderr so `--output print` keeps stdout for segment URLs.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    subscriber
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
