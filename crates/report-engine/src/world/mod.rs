//! Typst World trait implementation for report compilation

pub mod fonts;
pub mod virtual_fs;
pub mod virtual_world;

pub use fonts::{global_font_cache, init_font_cache, FontCache};
pub use virtual_fs::VirtualFilesystem;
pub use virtual_world::VirtualWorld;
