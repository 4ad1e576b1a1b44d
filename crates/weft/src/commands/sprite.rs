//! `weft sprite` command implementation.

use std::path::PathBuf;

use clap::Args;
use weft_config::{CliSettings, Config};
use weft_sprite::{SpriteCompiler, SvgOptimizer};

use super::{ensure_project_dir, report_sprite_problems};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the sprite command.
#[derive(Args)]
pub(crate) struct SpriteArgs {
    /// Path to configuration file (default: auto-discover weft.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sprite output path (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SpriteArgs {
    /// Execute the sprite command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the sprite cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            sprite_output: self.output,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let sprite = &config.sprite_resolved;

        if sprite.output.starts_with(&config.project_resolved.project_dir) {
            ensure_project_dir(&config.project_resolved.project_dir)?;
        }

        let compiler = SpriteCompiler::new(&sprite.icons_dir, &sprite.output).with_optimizer(
            SvgOptimizer::with_stripped_attributes(sprite.strip_attributes.iter().cloned()),
        );
        let report = compiler.compile()?;

        report_sprite_problems(&output, &report);

        if report.written {
            output.success(&format!(
                "Compiled {} symbols into {}",
                report.symbols.len(),
                sprite.output.display()
            ));
        } else {
            output.warning(&format!(
                "No icons found in {}; sprite not written",
                sprite.icons_dir.display()
            ));
        }

        Ok(())
    }
}
