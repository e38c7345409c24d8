pub mod ecb;
pub mod parser;

pub use ecb::{EcbDocumentSource, RateDocumentSource};
pub use parser::RateTableParser;
