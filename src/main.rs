use anyhow::Result;
use clap::Parser;
use cmpdl::api::ApiCatalog;
use cmpdl::catalog::{Catalog, CatalogKind};
use cmpdl::config::load_config;
use cmpdl::http::HttpClient;
use cmpdl::install::{InstallOptions, install};
use cmpdl::scrape::ScrapeCatalog;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::debug;

const USAGE: &str = "Usage: cmpdl <project name>";

#[derive(Parser, Debug)]
#[command(
    name = "cmpdl",
    version,
    about = "Download a CurseForge modpack and assemble its .minecraft folder"
)]
struct Cli {
    /// Project slug, or numeric project id for the api catalog
    project: Option<String>,
    /// Catalog to resolve the project against
    #[arg(long, value_enum, default_value = "api")]
    catalog: CatalogKind,
    /// Folder the run directory is created in
    #[arg(long)]
    output: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(project) = cli
        .project
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
    else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    if let Err(err) = run(&cli, &project) {
        eprintln!("error: {err}");
        let mut source = err.source();
        while let Some(inner) = source {
            eprintln!("  caused by: {inner}");
            source = inner.source();
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, project: &str) -> Result<()> {
    let config = load_config()?;
    debug!(?config, catalog = %cli.catalog, "loaded config");

    let http = HttpClient::new(&config.user_agent)?;
    let catalog: Box<dyn Catalog> = match cli.catalog {
        CatalogKind::Api => Box::new(ApiCatalog::new(http.clone(), &config.api_base_url)),
        CatalogKind::Scrape => Box::new(ScrapeCatalog::new(http.clone(), &config.scrape_base_url)),
    };

    let output_root = cli
        .output
        .clone()
        .or(config.output_root.clone())
        .unwrap_or_else(|| cli.catalog.default_output_root());
    let options = InstallOptions {
        output_root,
        resolve_concurrency: config.resolve_concurrency,
        show_progress: std::io::stderr().is_terminal(),
    };

    install(catalog.as_ref(), &http, project, &options)?;
    Ok(())
}
