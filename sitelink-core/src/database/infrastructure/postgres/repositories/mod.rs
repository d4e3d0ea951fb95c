mod catalog;
mod dismantles;
mod installations;
mod load_index;
mod relocations;

pub use catalog::PostgresCatalogRepository;
pub use dismantles::PostgresDismantlesRepository;
pub use installations::PostgresInstallationsRepository;
pub use load_index::PostgresLoadIndexRepository;
pub use relocations::PostgresRelocationsRepository;
