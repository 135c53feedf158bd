use {
    clap::Parser,
    coffer::{Coffer, config::CofferServerConfig, logging::init_logging},
    tracing::error,
};

#[derive(Parser)]
#[command(version, about = "Banking ledger HTTP server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match CofferServerConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load server config file: {e}");
            return;
        }
    };

    if let Err(e) = init_logging(config.debug, &config.log_dir) {
        eprintln!("Error: failed to initialize logging in {}: {e}", config.log_dir);
        return;
    }

    let mut app = match Coffer::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to open account store: {}", e);
            return;
        }
    };

    if let Err(e) = app.run().await {
        error!("Coffer failed to run: {}", e);
    }
}
