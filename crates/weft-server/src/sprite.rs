//! Sprite recompilation off the async runtime.

use std::sync::Arc;

use weft_sprite::{SpriteCompiler, SpriteReport};

/// Recompile the sprite on a blocking thread.
///
/// Failures are logged; the previous sprite file (if any) stays in place.
pub(crate) async fn recompile(compiler: Arc<SpriteCompiler>) -> Option<SpriteReport> {
    let output = compiler.output_path().to_path_buf();
    match tokio::task::spawn_blocking(move || compiler.compile()).await {
        Ok(Ok(report)) => Some(report),
        Ok(Err(err)) => {
            tracing::warn!(output = %output.display(), error = %err, "Sprite compilation failed");
            None
        }
        Err(err) => {
            tracing::error!(error = %err, "Sprite compilation task panicked");
            None
        }
    }
}
