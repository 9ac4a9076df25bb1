pub mod error;
pub mod exec;
pub mod logger;
pub mod validation;
