pub mod actions;
pub mod merge;
pub mod paths;
pub mod redact;
pub mod template;
pub mod text;
pub mod url_builder;
