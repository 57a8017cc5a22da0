mod cli;
mod config;
mod error;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use html2pdf_render::Renderer;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    // Usage errors (including a malformed --margin) exit with status 2 here,
    // before anything is rendered.
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let request = cli.request();
    let pdf = cli.pdf_options(&config)?;
    let render = cli.render_options(&config);
    let renderer = match cli.chrome.as_ref().or(config.chrome.as_ref()) {
        Some(chrome) => Renderer::with_chrome(chrome),
        None => Renderer::new().or_raise(|| ErrorKind::Convert)?,
    };
    tracing::debug!(chrome = %renderer.chrome_path().display(), "Using browser");

    let output = renderer.convert(&request, &pdf, &render).await.or_raise(|| ErrorKind::Convert)?;
    tracing::info!("OK: {}", output.display());
    Ok(())
}
