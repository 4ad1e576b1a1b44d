//! `weft build` command implementation.

use std::path::PathBuf;

use clap::Args;
use weft_build::{BuildConfig, build_site};
use weft_config::{CliSettings, Config};

use super::report_sprite_problems;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover weft.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, a page cannot be read, or
    /// output cannot be written. Broken imports are reported but do not fail
    /// the build.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            out_dir: self.out_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(config_path = ?config.config_path, "Configuration loaded");
        let build_config = BuildConfig::from_config(&config);

        output.info(&format!(
            "Building {} into {}",
            build_config.source_dir.display(),
            build_config.out_dir.display()
        ));

        let report = build_site(&build_config)?;

        for page in &report.diagnostics {
            output.warning(&format!("{}: {}", page.page.display(), page.diagnostic));
        }
        report_sprite_problems(&output, &report.sprite);

        if report.sprite.written {
            output.detail(&format!(
                "Sprite: {} symbols -> {}",
                report.sprite.symbols.len(),
                build_config.sprite_output().display()
            ));
        } else {
            output.detail("Sprite: no icons found");
        }

        let summary = format!(
            "Built {} pages ({} import problems)",
            report.pages.len(),
            report.diagnostics.len()
        );
        if report.diagnostics.is_empty() {
            output.success(&summary);
        } else {
            output.warning(&summary);
        }

        Ok(())
    }
}
