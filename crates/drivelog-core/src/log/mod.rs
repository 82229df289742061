//! Driver log extraction module.

mod form;
mod parser;
pub mod rules;
pub mod segment;
mod visits;

pub use parser::DriverLogExtractor;
pub use segment::{segment, EntryBlock, Segmentation};
