//! Application layer - Use cases that coordinate domain services.
//!
//! This layer contains the application-specific business rules and orchestrates
//! the flow of data between the CLI layer and the migration core.

mod migrate;

pub use migrate::{MIGRATIONS_FILE, MigrateOptions, MigrateReport, MigrateUseCase};
