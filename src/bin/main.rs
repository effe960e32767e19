//! Contact report CLI - render report data from a JSON dataset
//!
//! Usage:
//!   contact-report render --data <crm.json> --params <params.json> --url <url> --user <name>
//!   contact-report providers
//!
//! Examples:
//!   contact-report render --data demos/crm.json --params demos/params.json \
//!       --url https://crm.example.com/app --user Supervisor
//!   contact-report render --data demos/crm.json --params demos/params.json \
//!       --url https://crm.example.com --user Supervisor --typed

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use contact_report::config::SettingsError;
use contact_report::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contact-report")]
#[command(about = "Contact report - assemble report data from a CRM entity store")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render report data as JSON
    Render {
        /// JSON dataset with schemas and rows
        #[arg(short, long)]
        data: PathBuf,

        /// JSON report parameters
        #[arg(short, long)]
        params: PathBuf,

        /// URL of the inbound request
        #[arg(short, long)]
        url: String,

        /// Display name of the current user
        #[arg(long)]
        user: String,

        /// Provider to render with
        #[arg(long, default_value = ContactReportDataProvider::NAME)]
        provider: String,

        /// Print the typed contact report instead of the section dictionary.
        /// Always uses the contact provider, so it cannot be combined with --provider
        #[arg(long, conflicts_with = "provider")]
        typed: bool,
    },

    /// List registered report data providers
    Providers,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings);

    let registry = match ProviderRegistry::with_defaults(&settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error configuring providers: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Render {
            data,
            params,
            url,
            user,
            provider,
            typed,
        } => {
            let args = RenderArgs {
                data,
                params,
                url,
                user,
                provider,
                typed,
            };
            cmd_render(&settings, &registry, args)
        }
        Commands::Providers => cmd_providers(&registry),
    }
}

fn load_settings(path: Option<&Path>) -> Result<ReportSettings, SettingsError> {
    match path {
        Some(path) => ReportSettings::from_file(path),
        None => ReportSettings::load(),
    }
}

fn init_tracing(settings: &ReportSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct RenderArgs {
    data: PathBuf,
    params: PathBuf,
    url: String,
    user: String,
    provider: String,
    typed: bool,
}

fn cmd_render(
    settings: &ReportSettings,
    registry: &ProviderRegistry,
    args: RenderArgs,
) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(render(settings, registry, &args)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Report error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn render(
    settings: &ReportSettings,
    registry: &ProviderRegistry,
    args: &RenderArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let dataset = read_file(&args.data)?;
    let host = Arc::new(MemoryHost::from_json(&dataset)?);
    let parameters = ReportParameters::from_json(&read_file(&args.params)?)?;
    let request = RequestContext::parse(&args.url)?;
    let connection = UserConnection::with_host(host, UserIdentity::named(&args.user));

    if args.typed {
        let provider = ContactReportDataProvider::from_settings(settings)?;
        let report = provider.fetch(&connection, &request, &parameters).await?;
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let provider = registry.get(&args.provider)?;
    let data = provider.get_data(&connection, &request, &parameters).await?;
    Ok(serde_json::to_string_pretty(&data)?)
}

fn read_file(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e).into())
}

fn cmd_providers(registry: &ProviderRegistry) -> ExitCode {
    println!("Providers:");
    for name in registry.names() {
        println!("  - {}", name);
    }
    ExitCode::SUCCESS
}
