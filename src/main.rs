//! plughost — host binary.
//!
//! Loads configuration, scans the plugin directory for manifests, runs one
//! load cycle and prints every loaded plugin as a JSON line.

use std::collections::HashSet;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use plughost_core::config::AppConfig;
use plughost_core::error::AppError;
use plughost_plugin::{ClosureListener, ListenerAction, PluginManager, PluginsLoadingEvent};

#[derive(Debug, Parser)]
#[command(name = "plughost", version, about = "Load plugins from a manifest directory")]
struct Cli {
    /// Configuration overlay to merge (`config/<env>`).
    #[arg(long, default_value = "development")]
    env: String,

    /// Plugin directory. Overrides configuration.
    #[arg(long)]
    directory: Option<String>,

    /// Only load this identifier. Repeatable; overrides configuration.
    #[arg(long = "only", value_name = "ID")]
    only: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match AppConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Some(directory) = cli.directory {
        config.plugins.directory = directory;
    }
    if !cli.only.is_empty() {
        config.plugins.allow_list = Some(cli.only);
    }

    init_logging(&config);

    if let Err(e) = run(config) {
        tracing::error!(error = %e, "plughost failed");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        directory = %config.plugins.directory,
        extension = %config.plugins.extension,
        "Starting plughost v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut manager = PluginManager::from_config(&config.plugins);

    manager.listen(
        PluginsLoadingEvent::NAME,
        ClosureListener::wrap("startup-report", |event| {
            if let Some(loading) = event.downcast_ref::<PluginsLoadingEvent>() {
                tracing::info!(plugins = ?loading.plugin_ids(), "Plugins ready");
            }
            Ok(ListenerAction::Continue)
        }),
    )?;

    if !config.plugins.auto_load {
        tracing::info!("Plugin auto-load disabled");
        return Ok(());
    }

    let allow_list: Option<HashSet<String>> = config
        .plugins
        .allow_list
        .map(|ids| ids.into_iter().collect());
    manager.load_plugins(allow_list.as_ref())?;

    for plugin in manager.plugins() {
        let line = serde_json::json!({
            "id": plugin.identifier(),
            "data": plugin.data(),
        });
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(())
}
