//! Operator CLI for the engine config synchronizer.
//!
//! # Architecture Overview
//!
//! ```text
//!   settings.toml ──▶ config ──▶ SyncConfig ─────────────┐
//!                                                        ▼
//!   services.json ──▶ services ──▶ plugins::synthesizer ──▶ render ──▶ collectd.conf
//! ```
//!
//! The binary only checks and renders; supervising a live engine is done by
//! embedding [`collectd_sync::Synchronizer`] with an engine adapter.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use collectd_sync::config::{load_settings, SyncConfig};
use collectd_sync::observability::logging;
use collectd_sync::plugins::synthesizer;
use collectd_sync::render::{ConfigWriter, TemplateRenderer};
use collectd_sync::services::ServiceInstance;

#[derive(Parser)]
#[command(name = "collectd-sync")]
#[command(about = "Render collection engine configs from settings and discovered services", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a settings file and show the resolved values
    Check {
        #[arg(short, long)]
        settings: PathBuf,
    },
    /// Render the engine config for a list of services
    Render {
        #[arg(short, long)]
        settings: PathBuf,

        /// JSON array of discovered service instances
        #[arg(long)]
        services: Option<PathBuf>,

        /// Hostname advertised to the engine; empty lets the engine decide
        #[arg(long, default_value = "")]
        hostname: String,

        /// Write to the configured conffile instead of stdout
        #[arg(short, long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Check { settings } => {
            let config = SyncConfig::from_settings(&load_settings(&settings)?)?;
            let statics = synthesizer::static_plugins(&config.static_plugins)?;

            println!("conffile:       {}", config.conf_file.display());
            for dir in &config.templates_dirs {
                println!("templates dir:  {}", dir.display());
            }
            println!("plugins dir:    {}", config.plugins_dir.display());
            println!("template map:   {} entries", config.template_map.len());
            println!("interval:       {}s", config.interval.as_secs());
            for plugin in statics {
                println!("static plugin:  {} ({})", plugin.name, plugin.plugin_type);
            }
        }
        Commands::Render {
            settings,
            services,
            hostname,
            write,
        } => {
            let config = SyncConfig::from_settings(&load_settings(&settings)?)?;
            let services: Vec<ServiceInstance> = match services {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => Vec::new(),
            };

            let plugins = synthesizer::merge(
                synthesizer::static_plugins(&config.static_plugins)?,
                synthesizer::service_plugins(&services, &config.template_map),
            );
            let writer = ConfigWriter::new(hostname, Arc::new(TemplateRenderer::new()));

            if write {
                writer.write(&config, &plugins)?;
            } else {
                print!("{}", writer.render(&config, &plugins)?);
            }
        }
    }

    Ok(())
}
