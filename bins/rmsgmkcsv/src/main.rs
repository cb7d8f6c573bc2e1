mod cmd;

use clap::Parser;
use cmd::config::{Cli, Commands, Effective};

fn main() {
    // stdout занят записями, логи идут в stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Create(args) => {
            Effective::new(cli.config.as_deref(), args).and_then(|eff| cmd::create::run(&eff))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
