pub mod app;
pub mod config;
pub mod constants;
pub mod domain;
pub mod errors;
pub mod managers;
pub mod rpc;
pub mod services;
pub mod stores;
pub mod utils;
