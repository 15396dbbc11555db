pub mod error;
pub mod field;
pub mod literal;
pub mod parser;
pub mod toml_document;

pub use error::*;
pub use field::*;
pub use literal::*;
pub use parser::parse_document;
pub use toml_document::parse_toml_document;
