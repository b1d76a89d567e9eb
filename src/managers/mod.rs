pub mod request;
pub mod workspace;
