//! Styling primitives shared by extraction and generation.

mod codec;
mod color;

pub use codec::{classify_font_name, RunStyle, Script, SizeBucket};
pub use color::Color;
