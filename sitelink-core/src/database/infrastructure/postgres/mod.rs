//! PostgreSQL-backed repository implementations.

pub mod repositories;

pub use repositories::{
    PostgresCatalogRepository, PostgresDismantlesRepository,
    PostgresInstallationsRepository, PostgresLoadIndexRepository,
    PostgresRelocationsRepository,
};
