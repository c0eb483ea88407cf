//! Layout algorithms for block graphs.

mod layout;
mod levels;

pub use layout::{plan_layout, LayoutConfig};
pub use levels::{level_columns, precursors};
