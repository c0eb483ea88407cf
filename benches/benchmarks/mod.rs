pub mod document;
pub mod grouping;
pub mod levels;
