//! Query tools over the schema store

mod error;
mod executor;
mod registry;
mod render;

pub use error::{ToolError, ToolResult};
pub use executor::ToolExecutor;
pub use registry::*;
