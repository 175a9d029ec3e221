pub mod application;
pub mod commands;
pub mod http;
pub mod migrate;
pub mod package;
pub mod registry;
pub mod runtime;
