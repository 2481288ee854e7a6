pub mod parser;
pub mod types;

pub use parser::{parse, parse_with_warnings};
pub use types::{Entity, ParsedMemory, Relation};
