pub mod archive;
pub mod change;
pub mod config;
pub mod spec;
pub mod validate;
