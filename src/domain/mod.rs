//! Typed entities shared by the resolution pipeline and the persistence layer.

mod entities;
mod execution;
mod method;

pub use entities::{Environment, Project, RequestDefinition, Tag, TagColor};
pub use execution::{ExecutionContext, ExecutionOutcome, HistoryEntry, ResolvedRequest, Share};
pub use method::HttpMethod;

/// Insertion-ordered string map used for headers, query parameters and variables.
pub type StringMap = indexmap::IndexMap<String, String>;

/// Epoch milliseconds.
pub type Timestamp = i64;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
