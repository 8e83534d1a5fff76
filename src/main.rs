use clap::{ArgAction, Parser, Subcommand};
use crud_contract::backend::InMemoryBackend;
use crud_contract::clients::{ClientError, HttpResourceClient, ResourceApi};
use crud_contract::fixtures::{FixtureError, FixtureStore};
use crud_contract::lifecycle::{setup_tracing, ConfigError, HarnessConfig, SuiteDriver};
use crud_contract::model::ResourceName;
use crud_contract::seed::{SeedError, Seeder, SqliteSeeder};
use crud_contract::verifier::SuiteReport;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "crud-contract", version, about = "Verifies the CRUD contract of a REST API")]
struct Cli {
    /// TOML config file; flags override its values.
    #[arg(long, value_name = "PATH", global = true, env = "CRUD_CONTRACT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the contract suite.
    Run(RunArgs),
    /// Wipe and repopulate a SQLite database from the dataset.
    Seed(SeedArgs),
}

#[derive(clap::Args, Debug)]
struct FixtureArgs {
    #[arg(long, value_name = "PATH")]
    dataset: Option<PathBuf>,

    #[arg(long = "test-cases", value_name = "PATH")]
    test_cases: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[arg(long, value_name = "URL", env = "CRUD_CONTRACT_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    #[command(flatten)]
    fixtures: FixtureArgs,

    /// Only verify this resource; repeatable.
    #[arg(long = "resource", value_name = "NAME")]
    resources: Vec<ResourceName>,

    #[arg(long, action = ArgAction::SetTrue)]
    parallel: bool,

    /// Verify an in-process backend seeded from the dataset instead of a server.
    #[arg(long, action = ArgAction::SetTrue)]
    in_memory: bool,
}

#[derive(clap::Args, Debug)]
struct SeedArgs {
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(flatten)]
    fixtures: FixtureArgs,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fixtures(#[from] FixtureError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error("No database path given (use --database or database_path)")]
    NoDatabase,

    #[error("Shutdown failed: {0}")]
    Shutdown(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();

    let result = match load_config(cli.config.as_ref()) {
        Ok(config) => match cli.command {
            Command::Run(args) => run(config, args).await,
            Command::Seed(args) => seed(config, args).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<HarnessConfig, CliError> {
    match path {
        Some(path) => Ok(HarnessConfig::load(path)?),
        None => Ok(HarnessConfig::default()),
    }
}

fn apply_fixture_args(config: &mut HarnessConfig, args: FixtureArgs) {
    if let Some(dataset) = args.dataset {
        config.dataset_path = dataset;
    }
    if let Some(test_cases) = args.test_cases {
        config.test_cases_path = test_cases;
    }
}

async fn run(mut config: HarnessConfig, args: RunArgs) -> Result<ExitCode, CliError> {
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if !args.resources.is_empty() {
        config.resources = args.resources;
    }
    config.parallel_resources |= args.parallel;
    apply_fixture_args(&mut config, args.fixtures);
    config.validate()?;

    let fixtures = Arc::new(FixtureStore::load(
        &config.dataset_path,
        &config.test_cases_path,
    )?);

    let report = if args.in_memory {
        let backend = InMemoryBackend::start();
        backend.reset(&fixtures).await?;
        let backend = Arc::new(backend);
        let report = drive(&config, backend.clone(), fixtures).await;
        match Arc::try_unwrap(backend) {
            Ok(backend) => backend.shutdown().await.map_err(CliError::Shutdown)?,
            Err(_) => warn!("In-memory backend still referenced, skipping shutdown"),
        }
        report
    } else {
        info!(base_url = %config.base_url, "Verifying remote API");
        let client = HttpResourceClient::new(&config.base_url, config.request_timeout())?;
        drive(&config, Arc::new(client), fixtures).await
    };

    print_report(&report);
    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn drive(
    config: &HarnessConfig,
    api: Arc<dyn ResourceApi>,
    fixtures: Arc<FixtureStore>,
) -> SuiteReport {
    SuiteDriver::new(api, fixtures)
        .with_resources(config.selected_resources())
        .parallel(config.parallel_resources)
        .run()
        .await
}

fn print_report(report: &SuiteReport) {
    for resource in &report.resources {
        let status = if resource.passed() { "ok" } else { "FAILED" };
        println!("{:<10} {status}", resource.resource.as_str());
    }
    for failure in report.failures() {
        println!("  {failure}");
    }
    let (passed, failed, skipped) = report.counts();
    println!("\n{passed} passed, {failed} failed, {skipped} skipped");
}

async fn seed(mut config: HarnessConfig, args: SeedArgs) -> Result<ExitCode, CliError> {
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    apply_fixture_args(&mut config, args.fixtures);

    let path = config.database_path.clone().ok_or(CliError::NoDatabase)?;
    let fixtures = FixtureStore::load(&config.dataset_path, &config.test_cases_path)?;
    let inserted = SqliteSeeder::new(&path).reset(&fixtures).await?;

    println!("Seeded {inserted} records into {}", path.display());
    Ok(ExitCode::SUCCESS)
}
