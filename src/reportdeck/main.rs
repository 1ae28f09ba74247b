use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod cli;
use args::{Cli, Commands};
use cli::handlers::{handle_config, handle_download, handle_list, handle_upload, init_context};
use cli::shell::run_shell;
use reportdeck::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut ctx = init_context(&cli).await?;

    match cli.command {
        Some(Commands::List { search }) => handle_list(&mut ctx, search),
        Some(Commands::Upload { files }) => handle_upload(&mut ctx, files).await,
        Some(Commands::Download { name, out }) => handle_download(&mut ctx, &name, out),
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
        Some(Commands::Shell) | None => run_shell(&mut ctx).await,
    }
}
