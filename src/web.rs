#![cfg(not(tarpaulin_include))]

use cgpa::Config;
use cgpa::app;

/// Main entry point for the web application
///
/// Reads `CGPA_*` settings from the environment and serves the calculator.
/// Log verbosity follows `RUST_LOG` and defaults to `info`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!(
        "starting calculator (data dir {}, catalog {})",
        config.data_dir.display(),
        config
            .catalog_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "bundled".to_string())
    );

    app::run(config).await
}
