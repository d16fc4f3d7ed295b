mod cli; // Declare the cli module

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand}; // Use clap for argument parsing

/// Trellis: plugin dependency graph and lifecycle manager
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect registered plugins
    Plugins {
        #[command(subcommand)]
        command: PluginCommand,
    },
    /// Print dependency edges as `dependency -> dependent`
    Graph,
    /// Activate a built-in plugin
    Activate {
        /// The id of the plugin to activate
        id: String,
        /// Activate its dependencies first
        #[arg(long)]
        cascade: bool,
    },
    /// Apply a config file: activate its startup list, then dispose everything
    Run {
        /// JSON, YAML or TOML manager config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum PluginCommand {
    /// List registered plugins with their state
    List,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match &args.command {
        Commands::Run { config } => match cli::load_config(config.as_deref()) {
            Ok(config) => config,
            Err(e) => return cli::report(&e),
        },
        _ => Default::default(),
    };

    let manager = match cli::manager_or_exit(&config) {
        Ok(manager) => manager,
        Err(code) => return code,
    };

    match args.command {
        Commands::Plugins {
            command: PluginCommand::List,
        } => cli::list_plugins(&manager),
        Commands::Graph => cli::print_graph(&manager),
        Commands::Activate { id, cascade } => cli::activate(&manager, &id, cascade),
        Commands::Run { .. } => cli::run(&manager, &config),
    }
}
