//! `weft serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use weft_config::{CliSettings, Config};
use weft_server::{run_server, server_config_from_weft_config};

use super::ensure_project_dir;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover weft.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long, env = "WEFT_HOST")]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long, env = "WEFT_PORT")]
    port: Option<u16>,

    /// Enable verbose output (show import diagnostics and timing logs).
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable live reload (default: enabled).
    #[arg(long)]
    live_reload: Option<bool>,

    /// Disable live reload.
    #[arg(long, conflicts_with = "live_reload")]
    no_live_reload: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let live_reload_enabled = self.resolve_live_reload_enabled();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            source_dir: self.source_dir,
            live_reload_enabled,
            ..CliSettings::default()
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(config_path = ?config.config_path, "Configuration loaded");

        ensure_project_dir(&config.project_resolved.project_dir)?;

        output.info(&format!(
            "Starting server on http://{}:{}",
            config.server.host, config.server.port
        ));
        output.detail(&format!(
            "Source directory: {}",
            config.project_resolved.source_dir.display()
        ));
        output.detail(&format!(
            "Icons directory: {}",
            config.sprite_resolved.icons_dir.display()
        ));
        if config.live_reload.enabled {
            output.detail("Live reload: enabled");
        } else {
            output.detail("Live reload: disabled");
        }

        let server_config = server_config_from_weft_config(&config, self.verbose);
        run_server(server_config).await?;

        Ok(())
    }

    /// Resolve `live_reload_enabled` from --live-reload/--no-live-reload flags.
    fn resolve_live_reload_enabled(&self) -> Option<bool> {
        self.no_live_reload.then_some(false).or(self.live_reload)
    }
}
