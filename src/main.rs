use clap::Parser;
use flickr_gallery::app::App;
use flickr_gallery::cli::Args;
use flickr_gallery::config::Config;
use flickr_gallery::logging::setup_logging;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logging needs the config, so a bad config can only be reported on stderr.
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        config = %args.config.display(),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting flickr-gallery"
    );

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = ?e, "Failed to initialize application");
            return ExitCode::FAILURE;
        }
    };
    app.run().await
}
