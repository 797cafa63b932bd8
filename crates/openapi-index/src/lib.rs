//! # openapi-index
//!
//! In-memory index of one OpenAPI 3.x document.
//! Loads and dereferences an OpenAPI document, extracts operations and examples, and serves
//! schema lookups in full, simplified, compact or paginated form.

mod compact;
mod error;
mod examples;
mod operations;
mod paginate;
mod parser;
mod resolver;
mod schema;
mod simplify;
mod source;
mod store;
mod types;

pub use compact::format_compact;
pub use error::{LoadError, LoadResult};
pub use examples::ExampleIndex;
pub use operations::OperationExtractor;
pub use paginate::{paginate, PaginateOptions, PaginatedResult, DEFAULT_CHUNK_SIZE};
pub use parser::DocumentParser;
pub use resolver::resolve_document;
pub use schema::*;
pub use simplify::{simplify, SimplifyOptions, ENUM_NOTE_KEY};
pub use source::{DefaultSource, DocumentSource};
pub use store::*;
pub use types::*;
