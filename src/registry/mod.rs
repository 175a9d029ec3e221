//! Package registries serving migration metadata.

mod npm;

pub use npm::{DEFAULT_FILES_URL, DEFAULT_REGISTRY_URL, NpmRegistry};
