pub mod book;
pub mod file;
pub mod math;
pub mod person;

use erudio_kernel::{settings::Settings, ModuleRegistry};
use sqlx::SqlitePool;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &SqlitePool, settings: &Settings) {
    registry.register(person::create_module(db, settings));
    registry.register(book::create_module(db, settings));
    registry.register(file::create_module(settings));
    registry.register(math::create_module());
}
