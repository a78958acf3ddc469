use clap::Parser;
use storefront_admin::cli::utils::{error_code, output_error};
use storefront_admin::cli::{Cli, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so ADMIN_API_URL and friends can live there
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = storefront_admin::cli::run(cli).await {
        match (output_format, std::env::var("CLI_VERBOSE").as_deref()) {
            (_, Ok("true")) | (_, Ok("1")) => eprintln!("Error: {e:?}"),
            (OutputFormat::Json, _) => {
                output_error(&output_format, &e.to_string(), Some(error_code(&e)))?
            }
            (OutputFormat::Text, _) => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
