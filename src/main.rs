use askpdf::Settings;
use askpdf::cli::{Cli, Commands, commands};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => commands::init::run_init(force),

        Commands::Serve => {
            // Load configuration, honoring --config when given
            let settings = match cli.config.as_deref() {
                Some(path) => Settings::load_from(path),
                None => Settings::load(),
            }
            .unwrap_or_else(|e| {
                eprintln!("Configuration error: {e}");
                Settings::default()
            });

            commands::serve::run(settings).await;
        }

        Commands::Upload { folder, api_url } => {
            commands::client::run_upload(&folder, &api_url).await;
        }

        Commands::Query { query, api_url } => {
            commands::client::run_query(&query, &api_url).await;
        }
    }
}
