pub mod archive;
pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod markdown;
pub mod merge;
pub mod paths;
pub mod report;
pub mod requirement_blocks;
pub mod rules;
pub mod schema;
pub mod tasks;
pub mod types;
pub mod validator;
pub mod workspace;

pub use error::{Result, SpecError};
