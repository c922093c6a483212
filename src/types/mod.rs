mod color;
mod models;

pub use color::{COLOR_PALETTE, color_class};
pub use models::*;
