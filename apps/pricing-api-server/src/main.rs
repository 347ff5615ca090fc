use anyhow::{anyhow, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig, HealthState};
use apikit::{PageLimits, ReadinessProbe, VersionInfo};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use pricing_api::api::rest::routes::register_routes;
use pricing_api::domain::plain_language::{AnnotationPolicy, DemandOutlookPolicy};
use pricing_api::domain::service::{Service, ServiceConfig, Sources};
use pricing_api::infra::{Dataset, InMemoryStore, PgStore};
use pricing_api::PricingApiConfig;
use runtime::{ApiConfig, AppConfig, CliArgs, DatabaseConfig};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Pricing API Server - read-only pricing and demand forecast API
#[derive(Parser)]
#[command(name = "pricing-api-server")]
#[command(about = "Pricing API Server - read-only pricing and demand forecast API")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Serve the built-in sample dataset instead of PostgreSQL
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Pricing API server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

fn service_config(api: &ApiConfig) -> ServiceConfig {
    ServiceConfig {
        limits: PageLimits {
            default_page_size: api.default_page_size,
            max_page_size: api.max_page_size,
        },
        default_sort: api.default_sort.clone(),
        include_plain_language_fields: api.include_plain_language_fields,
        annotation: AnnotationPolicy {
            mirror_price_decreases: api.mirror_price_decreases,
            demand: DemandOutlookPolicy::from_thresholds(api.demand_outlook_thresholds),
        },
    }
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    let raw = format!("{}:{}", config.server.host, config.server.port);
    raw.parse()
        .map_err(|e| anyhow!("Invalid bind address '{}': {}", raw, e))
}

fn database_config(config: &AppConfig) -> Result<&DatabaseConfig> {
    let db = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("No database configured; pass --mock to serve sample data"))?;
    if db.url.trim().is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    Ok(db)
}

/// Wire the data sources: the sample dataset with `--mock`, PostgreSQL otherwise.
fn build_sources(
    config: &AppConfig,
    args: &CliArgs,
) -> Result<(Sources, Arc<dyn ReadinessProbe>)> {
    if args.mock {
        tracing::warn!("--mock: serving the built-in sample dataset");
        let store = Arc::new(InMemoryStore::new(Dataset::sample()));
        let probe: Arc<dyn ReadinessProbe> = store.clone();
        return Ok((Sources::shared(store), probe));
    }

    let db = database_config(config)?;
    let module: PricingApiConfig = config.module_config("pricing_api")?;

    // Lazy pool: the server comes up without the database and /ready reports it.
    let pool = PgPoolOptions::new()
        .max_connections(db.max_conns.unwrap_or(10))
        .acquire_timeout(Duration::from_millis(db.acquire_timeout_ms.unwrap_or(5000)))
        .connect_lazy(&db.url)
        .context("Invalid database URL")?;
    tracing::info!(max_conns = db.max_conns.unwrap_or(10), "PostgreSQL pool configured");

    let store = Arc::new(PgStore::new(pool, module.tables)?);
    let probe: Arc<dyn ReadinessProbe> = store.clone();
    Ok((Sources::shared(store), probe))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let addr = bind_addr(&config)?;
    let ingress_config: ApiIngressConfig = config.module_config("api_ingress")?;
    let (sources, probe) = build_sources(&config, &args)?;

    let api = config.api.clone();
    let version = VersionInfo::from_path(&api.api_version_path, api.schema_version.clone());
    let service = Arc::new(Service::new(sources, service_config(&api), version));

    let ingress = ApiIngress::new(ingress_config, HealthState::new(api, probe));
    let router = ingress.build_router(register_routes(Router::new(), service))?;

    let cancel = api_ingress::shutdown::cancel_on_signals();
    let grace = Duration::from_secs(config.server.timeout_sec);
    api_ingress::serve(addr, router, cancel, grace).await
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    bind_addr(&config)?;
    let _: ApiIngressConfig = config.module_config("api_ingress")?;
    let module: PricingApiConfig = config.module_config("pricing_api")?;
    module.tables.validate()?;
    if !args.mock {
        database_config(&config)?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    Ok(())
}
