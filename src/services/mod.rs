pub mod clock;
pub mod executor;
pub mod history;
pub mod logger;
pub mod policy;
pub mod share;
pub mod token;
pub mod validation;
