//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod serve;
pub(crate) mod sprite;

pub(crate) use build::BuildArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use sprite::SpriteArgs;

use weft_sprite::SpriteReport;

use crate::output::Output;

/// Print skipped icons and identifier collisions from a sprite run.
pub(crate) fn report_sprite_problems(output: &Output, report: &SpriteReport) {
    for skipped in &report.skipped {
        output.warning(&format!(
            "Skipped icon {}: {}",
            skipped.path.display(),
            skipped.reason
        ));
    }
    for collision in &report.collisions {
        output.warning(&format!(
            "Duplicate icon id \"{}\": {} replaces {}",
            collision.id,
            collision.kept.display(),
            collision.replaced.display()
        ));
    }
}

/// Ensure the `.weft/` project directory exists with a `.gitignore`.
pub(crate) fn ensure_project_dir(project_dir: &std::path::Path) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(project_dir)?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(&gitignore_path, "# Automatically created by weft\n*\n")?;
    }

    Ok(())
}
