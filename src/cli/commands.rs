//! CLI command implementations
//!
//! Every command loads the config first, installs logging, then does its
//! work. Output is one JSON object on stdout; logs go to stderr.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::runtime::Runtime;

use crate::descriptor::{read_dir, DescriptorSource};
use crate::model::ModelRegistry;
use crate::observability::{init_logging, log_event_with_fields, Event};
use crate::reconcile::Reconciler;
use crate::store::{DocumentStore, FileStore};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command. Failures are
/// reported on stdout as an error response and returned to main.rs.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let result = run_command(cli.command);
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let data = match cmd {
        Command::Init { config } => init(&config)?,
        Command::Check { config } => check(&config)?,
        Command::Reconcile { config } => reconcile(&config)?,
        Command::Versions { config } => versions(&config)?,
        Command::Insert { config, table } => {
            let record = read_request()?;
            insert(&config, &table, record)?
        }
    };
    write_response(data)
}

/// Create the data directory layout
///
/// Creates `<data_dir>/data`. Fails if it already exists.
pub fn init(config_path: &Path) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    let dir = data_dir.join("data");
    fs::create_dir_all(&dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
    })?;

    log_event_with_fields(Event::DataDirInitialized, &[("data_dir", config.data_dir.as_str())]);
    Ok(json!({"initialized": true}))
}

/// Validate every descriptor file without opening the store
pub fn check(config_path: &Path) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let descriptors = Reconciler::check(load_sources(&config)?)?;

    let tables: Vec<Value> = descriptors
        .values()
        .map(|d| {
            json!({
                "name": d.name,
                "version": d.version,
                "source": d.source_id,
                "columns": d.columns.len(),
            })
        })
        .collect();

    Ok(json!({"tables": tables}))
}

/// Run one reconciliation pass
pub fn reconcile(config_path: &Path) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let runtime = runtime()?;

    let models = runtime.block_on(run_pass(&config, store))?;
    Ok(json!({"tables": models.summary()}))
}

/// Print persisted version records
pub fn versions(config_path: &Path) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let runtime = runtime()?;

    let records = runtime.block_on(async {
        Reconciler::new(store).version_registry().list_all().await
    })?;

    Ok(json!({"versions": records}))
}

/// Reconcile, then save `record` through the model of `table`
pub fn insert(config_path: &Path, table: &str, record: Value) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let runtime = runtime()?;

    runtime.block_on(async {
        let models = run_pass(&config, store.clone()).await?;
        let model = models
            .get(table)
            .ok_or_else(|| CliError::unknown_table(table))?;
        Ok(model.save(store.as_ref(), record).await?)
    })
}

fn load_config(path: &Path) -> CliResult<Config> {
    let config = Config::load(path)?;
    init_logging(Some(&config.log_filter));
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("data_dir", config.data_dir.as_str()),
            ("descriptor_dir", config.descriptor_dir.as_str()),
        ],
    );
    Ok(config)
}

fn load_sources(config: &Config) -> CliResult<Vec<DescriptorSource>> {
    Ok(read_dir(config.descriptor_path(), &config.descriptor_suffix)?)
}

fn open_store(config: &Config) -> CliResult<Arc<dyn DocumentStore>> {
    let data_dir = config.data_path();
    if !is_initialized(data_dir) {
        return Err(CliError::not_initialized());
    }
    Ok(Arc::new(FileStore::open(data_dir)?))
}

fn runtime() -> CliResult<Runtime> {
    Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

async fn run_pass(config: &Config, store: Arc<dyn DocumentStore>) -> CliResult<ModelRegistry> {
    let sources = load_sources(config)?;
    let reconciler = Reconciler::new(store).with_timestamp_mode(config.timestamp_mode);
    Ok(reconciler.run(sources).await?)
}

/// Check if data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join("data").is_dir()
}
