//! SVG sprite compilation for weft.
//!
//! Turns a directory of standalone icon files into one sprite document:
//!
//! ```text
//! icons/arrow.svg  ─┐                        <svg style="display: none">
//! icons/ui/star.svg ─┼─► optimize ─► extract ─►   <symbol id="arrow" viewBox="...">...</symbol>
//! icons/close.svg  ─┘                            <symbol id="close">...</symbol>
//!                                                 <symbol id="star" viewBox="...">...</symbol>
//!                                             </svg>
//! ```
//!
//! Pages reference icons as `<use href="/sprite.svg#star"/>`. Each icon is
//! processed on its own; a malformed icon is logged, listed in the
//! [`SpriteReport`] and left out of the sprite without stopping the batch.
//!
//! # Example
//!
//! ```ignore
//! use weft_sprite::SpriteCompiler;
//!
//! let compiler = SpriteCompiler::new("src/icons", "dist/sprite.svg");
//! let report = compiler.compile()?;
//! println!("{} symbols", report.symbols.len());
//! ```

mod compiler;
mod extract;
mod optimize;
mod scan;

pub use compiler::{
    IconCollision, SkipReason, SkippedIcon, SpriteCompiler, SpriteError, SpriteReport, Symbol,
    render_sprite,
};
pub use extract::{MarkupError, SvgRoot, check_standalone, extract_root};
pub use optimize::{DEFAULT_STRIPPED_ATTRIBUTE, OptimizeError, SvgOptimizer, Transform};
pub use scan::{IconEntry, scan_icons};
