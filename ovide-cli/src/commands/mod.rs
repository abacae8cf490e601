//! CLI command implementations.

pub mod related;
pub mod render;

pub use related::list_related;
pub use render::{render_block, RenderOptions};
