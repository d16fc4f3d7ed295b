use std::process::ExitCode;

use log::info;

use core_logging::LoggingPlugin;
use core_metrics::MetricsPlugin;
use trellis_core::plugin_system::{PluginCatalog, PluginManager};
use trellis_core::{Error, ManagerConfig};

/// Exit code for a plugin that exists but could not be activated
const EXIT_REFUSED: u8 = 1;
/// Exit code for bad input: unknown plugin ids or unreadable config
const EXIT_USAGE: u8 = 2;

/// Plugins compiled into the binary
pub fn builtin_catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with(LoggingPlugin::descriptor())
        .with(MetricsPlugin::descriptor())
}

/// Manager with every built-in plugin registered
pub fn build_manager(config: &ManagerConfig) -> Result<PluginManager, Error> {
    let manager = PluginManager::from_config(config);
    for (id, result) in manager.register_catalog(&builtin_catalog()) {
        result?;
        info!("Registered built-in plugin '{}'", id);
    }
    Ok(manager)
}

/// Print `e` and map it to the usage exit code
pub fn report(e: &Error) -> ExitCode {
    eprintln!("Error: {}", e);
    ExitCode::from(EXIT_USAGE)
}

pub fn list_plugins(manager: &PluginManager) -> ExitCode {
    for id in manager.registered_plugins() {
        let Some(descriptor) = manager.descriptor(&id) else {
            continue;
        };
        let name = descriptor.name().unwrap_or("<unnamed>");
        let version = descriptor
            .version()
            .map(|v| format!(" v{}", v))
            .unwrap_or_default();
        let state = manager
            .state(&id)
            .map(|state| state.to_string())
            .unwrap_or_default();
        let requires: Vec<String> = descriptor
            .dependencies()
            .iter()
            .map(|dep| {
                if dep.optional {
                    format!("{}?", dep.plugin_id)
                } else {
                    dep.plugin_id.to_string()
                }
            })
            .collect();

        if requires.is_empty() {
            println!("{}  {}{}  [{}]", id, name, version, state);
        } else {
            println!("{}  {}{}  [{}]  requires: {}", id, name, version, state, requires.join(", "));
        }
    }
    ExitCode::SUCCESS
}

pub fn print_graph(manager: &PluginManager) -> ExitCode {
    for (dependency, dependent) in manager.edges() {
        println!("{} -> {}", dependency, dependent);
    }
    ExitCode::SUCCESS
}

pub fn activate(manager: &PluginManager, id: &str, cascade: bool) -> ExitCode {
    match manager.activate(id, cascade) {
        Ok(true) => {
            println!("activated {}", id);
            let active: Vec<String> = manager.active_plugins().iter().map(ToString::to_string).collect();
            println!("active: {}", active.join(", "));
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("could not activate {}", id);
            ExitCode::from(EXIT_REFUSED)
        }
        Err(e) => report(&e),
    }
}

pub fn run(manager: &PluginManager, config: &ManagerConfig) -> ExitCode {
    for outcome in manager.activate_startup(&config.startup) {
        println!("{}: {}", outcome.plugin, outcome.status);
    }
    manager.dispose_all();
    println!("disposed");
    ExitCode::SUCCESS
}

/// Load the config at `path`, or defaults when none is given
pub fn load_config(path: Option<&std::path::Path>) -> Result<ManagerConfig, Error> {
    match path {
        Some(path) => Ok(ManagerConfig::load(path)?),
        None => Ok(ManagerConfig::default()),
    }
}

/// Build the manager or print why it failed
pub fn manager_or_exit(config: &ManagerConfig) -> Result<PluginManager, ExitCode> {
    build_manager(config).map_err(|e| report(&e))
}
