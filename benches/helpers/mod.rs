pub mod generators;
pub mod traits;

pub use generators::*;
pub use traits::*;
