use clap::Parser;
use tinypng_cli::cli::{Args, Commands};
use tinypng_cli::commands::{run_compress, run_web_compress, write_completion, RunContext};
use tinypng_cli::config::ClientSettings;
use tinypng_cli::logger::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.quiet);

    let ctx = RunContext {
        settings: ClientSettings::with_timeout_secs(args.timeout),
        api_key: args.api_key,
        quiet: args.quiet,
    };

    match args.command {
        Commands::Compress { batch, download } => run_compress(&ctx, batch, download).await,
        Commands::WebCompress { batch } => run_web_compress(&ctx, batch).await,
        Commands::Completion { shell } => {
            write_completion(shell, &mut std::io::stdout());
            Ok(())
        }
    }
}
