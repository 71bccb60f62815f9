//! Extraction pipeline: sanitize, parse, validate or repair, convert, filter.

pub mod salvage;
pub mod sanitize;
pub mod schema;

mod parser;

pub use parser::{NarrativeParser, ParseError};
